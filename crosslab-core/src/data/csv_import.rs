//! CSV import loader.
//!
//! Reads a Yahoo-style daily export:
//! `Date,Open,High,Low,Close[,Adj Close],Volume`. Header names are matched
//! case-insensitively; extra columns are ignored. Rows with a missing or
//! unparseable OHLC value (`null`, empty) are skipped. Row order is kept
//! as-is: an unordered file is rejected later, not sorted here.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::provider::{DataError, DataSource, FetchResult, SeriesLoader};
use crate::domain::Bar;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date", alias = "DATE")]
    date: NaiveDate,
    #[serde(alias = "Open", alias = "OPEN", deserialize_with = "csv::invalid_option")]
    open: Option<f64>,
    #[serde(alias = "High", alias = "HIGH", deserialize_with = "csv::invalid_option")]
    high: Option<f64>,
    #[serde(alias = "Low", alias = "LOW", deserialize_with = "csv::invalid_option")]
    low: Option<f64>,
    #[serde(alias = "Close", alias = "CLOSE", deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
    #[serde(alias = "Volume", alias = "VOLUME", deserialize_with = "csv::invalid_option")]
    volume: Option<f64>,
}

impl CsvRow {
    fn into_bar(self) -> Option<Bar> {
        Some(Bar {
            date: self.date,
            open: self.open?,
            high: self.high?,
            low: self.low?,
            close: self.close?,
            volume: self.volume.map(|v| v.max(0.0).round() as u64).unwrap_or(0),
        })
    }
}

/// Loads one symbol's bars from a CSV file on disk.
///
/// The file holds a single symbol; the requested symbol is only used to label
/// the result.
pub struct CsvLoader {
    path: PathBuf,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every complete row in the file, in file order.
    pub fn read_all(&self) -> Result<Vec<Bar>, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DataError::CsvError(format!("{}: {e}", self.path.display())))?;

        let mut bars = Vec::new();
        let mut skipped = 0usize;
        for (line, record) in reader.deserialize::<CsvRow>().enumerate() {
            let row = record.map_err(|e| {
                DataError::CsvError(format!("{} row {}: {e}", self.path.display(), line + 1))
            })?;
            match row.into_bar() {
                Some(bar) => bars.push(bar),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::debug!(path = %self.path.display(), skipped, "skipped incomplete CSV rows");
        }
        Ok(bars)
    }
}

impl SeriesLoader for CsvLoader {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let bars: Vec<Bar> = self
            .read_all()?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();

        tracing::info!(
            symbol,
            path = %self.path.display(),
            bars = bars.len(),
            "loaded bars from CSV"
        );

        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::CsvImport,
        })
    }
}
