//! Series loader trait and structured data errors.
//!
//! The SeriesLoader trait abstracts over data sources (Yahoo Finance, CSV
//! import, synthetic) so the pipeline can swap implementations and tests can
//! mock them. The Parquet cache wraps any loader as another loader.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bar, Series};
use crate::error::InvalidArgument;

/// Why a loader could not supply bars.
///
/// These are designed to be displayable in both CLI and TUI contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no bars for '{symbol}' between {start} and {end}")]
    EmptyRange {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("no cached data for '{symbol}' and offline mode is on (run `crosslab download {symbol}` first)")]
    NoCachedDataOffline { symbol: String },

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("csv import error: {0}")]
    CsvError(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Cache,
    Synthetic,
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub source: DataSource,
}

impl FetchResult {
    /// Validate into a Series. An empty fetch is an input violation, not a
    /// degraded success.
    pub fn into_series(self) -> Result<Series, InvalidArgument> {
        Series::new(self.symbol, self.bars)
    }
}

/// Trait for series loaders (Yahoo Finance, CSV import, synthetic, cache).
///
/// Implementations return bars in ascending date order for `[start, end]`
/// inclusive. They own any retry policy; callers never retry.
pub trait SeriesLoader: Send + Sync {
    /// Human-readable name of this loader.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for a symbol over a date range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;

    /// Check if the loader is currently usable (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}

/// Progress callback for multi-symbol downloads.
pub trait DownloadProgress: Send {
    /// Called when starting to fetch a symbol.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called when a symbol fetch completes.
    fn on_complete(&self, symbol: &str, index: usize, total: usize, result: &Result<(), DataError>);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that emits `tracing` events.
pub struct LogProgress;

impl DownloadProgress for LogProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        tracing::info!("[{}/{}] fetching {symbol}", index + 1, total);
    }

    fn on_complete(
        &self,
        symbol: &str,
        _index: usize,
        _total: usize,
        result: &Result<(), DataError>,
    ) {
        match result {
            Ok(()) => tracing::info!("  ok: {symbol}"),
            Err(e) => tracing::warn!("  failed: {symbol}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        tracing::info!("download complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}
