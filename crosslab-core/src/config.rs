//! TOML configuration for signal runs.
//!
//! Every section and key has a default, so an empty file is a valid config.
//! Front ends load a file (optional), apply their own overrides, then call
//! [`CrosslabConfig::validate`] before using it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::engine::{SignalRequest, DEFAULT_LONG_WINDOW, DEFAULT_SHORT_WINDOW};
use crate::error::InvalidArgument;

pub const DEFAULT_SYMBOL: &str = "WIPRO.NS";
pub const DEFAULT_CACHE_DIR: &str = "data";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid date '{value}' (expected YYYY-MM-DD): {reason}")]
    InvalidDate { value: String, reason: String },

    #[error(transparent)]
    Invalid(#[from] InvalidArgument),

    #[error("data source is csv but no csv_path is set")]
    MissingCsvPath,

    #[error("unknown {key} '{value}' (expected one of: {expected})")]
    UnknownValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Parse a `YYYY-MM-DD` date as given on a command line.
pub fn parse_date(value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| ConfigError::InvalidDate {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrosslabConfig {
    pub signal: SignalSection,
    pub data: DataConfig,
    pub output: OutputConfig,
}

impl CrosslabConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// The validated request described by the `[signal]` section.
    pub fn to_request(&self) -> Result<SignalRequest, ConfigError> {
        let s = &self.signal;
        Ok(SignalRequest::new(
            s.symbol.as_str(),
            s.start_date,
            s.end_date,
            s.short_window,
            s.long_window,
        )?)
    }

    /// Check every section; returns the request on success.
    pub fn validate(&self) -> Result<SignalRequest, ConfigError> {
        self.data.validate()?;
        self.to_request()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalSection {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for SignalSection {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            short_window: DEFAULT_SHORT_WINDOW,
            long_window: DEFAULT_LONG_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    #[default]
    Yahoo,
    Csv,
    Synthetic,
}

impl FromStr for DataSourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "csv" => Ok(Self::Csv),
            "synthetic" => Ok(Self::Synthetic),
            _ => Err(ConfigError::UnknownValue {
                key: "data source",
                value: s.to_string(),
                expected: "yahoo, csv, synthetic",
            }),
        }
    }
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yahoo => "yahoo",
            Self::Csv => "csv",
            Self::Synthetic => "synthetic",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub source: DataSourceKind,
    /// Root of the Parquet cache (Yahoo source only).
    pub cache_dir: PathBuf,
    /// Serve from the cache only; never touch the network.
    pub offline: bool,
    pub csv_path: Option<PathBuf>,
    /// Extra calendar days fetched before the start date so the averages
    /// at the start of the visible range have history behind them.
    pub history_padding_days: u32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: DataSourceKind::default(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            offline: false,
            csv_path: None,
            history_padding_days: 0,
        }
    }
}

impl DataConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source == DataSourceKind::Csv && self.csv_path.is_none() {
            return Err(ConfigError::MissingCsvPath);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnknownValue {
                key: "output format",
                value: s.to_string(),
                expected: "table, csv, json",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Write here instead of stdout.
    pub path: Option<PathBuf>,
}
