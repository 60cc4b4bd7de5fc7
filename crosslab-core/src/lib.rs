//! CrossLab Core: moving-average crossover signals over daily OHLCV series.
//!
//! This crate contains everything except the front ends:
//! - Domain types (bars, validated series, moving-average windows)
//! - Expanding-window SMA indicator and per-bar Buy/Sell/Hold classification
//! - `SignalEngine` and the loader → engine pipeline
//! - Series loaders (Yahoo Finance, CSV import, synthetic) behind a read-through Parquet cache
//! - TOML configuration, signal reports and CSV/JSON export

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod export;
pub mod indicators;
pub mod pipeline;
pub mod report;
pub mod signal;

pub use config::{ConfigError, CrosslabConfig};
pub use domain::{Bar, MovingAverageWindow, Series, WindowRole};
pub use engine::{SignalEngine, SignalParams, SignalRequest};
pub use error::{EngineError, InvalidArgument};
pub use report::{Marker, SignalReport, SignalSummary};
pub use signal::{compute_moving_averages, generate_signals, AveragedBar, Signal};
