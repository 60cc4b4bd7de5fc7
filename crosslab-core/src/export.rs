//! Signal export (CSV/JSON).
//!
//! One row per visible bar. Exports are a presentation of a report; nothing
//! here is read back by the engine.

use chrono::NaiveDate;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::engine::SignalParams;
use crate::report::{SignalReport, SignalSummary};
use crate::signal::Signal;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("json write failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flat export row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub short_ma: f64,
    pub long_ma: f64,
    pub signal: Signal,
    pub signal_code: i8,
}

pub fn signal_rows(report: &SignalReport) -> Vec<SignalRow> {
    report
        .visible_rows()
        .map(|(row, signal)| SignalRow {
            date: row.bar.date,
            open: row.bar.open,
            high: row.bar.high,
            low: row.bar.low,
            close: row.bar.close,
            volume: row.bar.volume,
            short_ma: row.short_ma,
            long_ma: row.long_ma,
            signal,
            signal_code: signal.code(),
        })
        .collect()
}

#[derive(Serialize)]
struct JsonExport<'a> {
    symbol: &'a str,
    params: SignalParams,
    start: NaiveDate,
    end: NaiveDate,
    summary: SignalSummary,
    rows: Vec<SignalRow>,
}

pub fn write_signals_csv<W: Write>(writer: W, report: &SignalReport) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in signal_rows(report) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_signals_json<W: Write>(mut writer: W, report: &SignalReport) -> Result<(), ExportError> {
    let (start, end) = report.visible_range();
    let doc = JsonExport {
        symbol: report.symbol(),
        params: report.params(),
        start,
        end,
        summary: report.summary(),
        rows: signal_rows(report),
    };
    serde_json::to_writer_pretty(&mut writer, &doc)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>, ExportError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| ExportError::Create {
            path: path.to_path_buf(),
            source,
        })
}

pub fn write_signals_csv_file(path: &Path, report: &SignalReport) -> Result<(), ExportError> {
    write_signals_csv(create(path)?, report)?;
    tracing::info!(path = %path.display(), "wrote signals CSV");
    Ok(())
}

pub fn write_signals_json_file(path: &Path, report: &SignalReport) -> Result<(), ExportError> {
    write_signals_json(create(path)?, report)?;
    tracing::info!(path = %path.display(), "wrote signals JSON");
    Ok(())
}
