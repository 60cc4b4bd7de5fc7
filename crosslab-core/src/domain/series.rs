//! Series: a validated, date-ordered run of bars for one symbol.

use chrono::NaiveDate;
use serde::Serialize;

use super::Bar;
use crate::error::InvalidArgument;

/// Check the engine preconditions on a bar slice.
///
/// - at least one bar
/// - dates strictly ascending (which also makes them unique)
/// - every close finite and > 0
///
/// Bars are never reordered; the first violation is reported.
pub fn validate_bars(bars: &[Bar]) -> Result<(), InvalidArgument> {
    if bars.is_empty() {
        return Err(InvalidArgument::EmptySeries);
    }

    for (index, bar) in bars.iter().enumerate() {
        if !bar.close.is_finite() || bar.close <= 0.0 {
            return Err(InvalidArgument::InvalidClose {
                index,
                date: bar.date,
                close: bar.close,
            });
        }
        if index > 0 && bars[index - 1].date >= bar.date {
            return Err(InvalidArgument::NonAscendingDates {
                index,
                previous: bars[index - 1].date,
                current: bar.date,
            });
        }
    }

    Ok(())
}

/// Ordered bars for one symbol. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    symbol: String,
    bars: Vec<Bar>,
}

impl Series {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, InvalidArgument> {
        validate_bars(&bars)?;
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }
}
