//! Series loaders: Yahoo Finance, CSV import, synthetic, and the Parquet cache.
//!
//! Loaders only move bars around. Validation into a `Series` happens in the
//! pipeline, so every source gets the same checks.

pub mod cache;
pub mod circuit_breaker;
pub mod csv_import;
pub mod download;
pub mod loader;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use cache::{CacheMeta, CacheStatus, CoverageResult, ParquetCache};
pub use circuit_breaker::CircuitBreaker;
pub use csv_import::CsvLoader;
pub use download::{download_symbols, DownloadSummary};
pub use loader::{open_loader, CachedLoader, LoadOptions};
pub use provider::{DataError, DataSource, DownloadProgress, FetchResult, LogProgress, SeriesLoader};
pub use synthetic::SyntheticLoader;
pub use yahoo::YahooLoader;
