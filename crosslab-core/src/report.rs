//! SignalReport: what the engine hands to a presenter.
//!
//! Rows cover the full computed series. The visible range is applied only
//! when presenting, so averages near the visible start may include bars
//! fetched before it.

use chrono::NaiveDate;
use serde::Serialize;

use crate::engine::SignalParams;
use crate::signal::{AveragedBar, Signal};

/// Averaged bars and their signals for one symbol, in ascending date order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalReport {
    symbol: String,
    params: SignalParams,
    rows: Vec<AveragedBar>,
    signals: Vec<Signal>,
    visible_start: NaiveDate,
    visible_end: NaiveDate,
}

/// A Buy or Sell point to draw on a chart, placed at the short MA.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Marker {
    pub date: NaiveDate,
    pub price: f64,
    pub signal: Signal,
}

/// Signal counts over the visible range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SignalSummary {
    pub bars: usize,
    pub buy: usize,
    pub sell: usize,
    pub hold: usize,
    pub last: Option<Signal>,
    pub last_date: Option<NaiveDate>,
}

impl SignalReport {
    /// Build a report over the whole of `rows`.
    ///
    /// `rows` must be non-empty and `signals` the same length; the engine is
    /// the only producer.
    pub(crate) fn new(
        symbol: &str,
        params: SignalParams,
        rows: Vec<AveragedBar>,
        signals: Vec<Signal>,
    ) -> Self {
        debug_assert_eq!(rows.len(), signals.len());
        let visible_start = rows.first().map(|r| r.bar.date).unwrap_or_default();
        let visible_end = rows.last().map(|r| r.bar.date).unwrap_or_default();
        Self {
            symbol: symbol.to_string(),
            params,
            rows,
            signals,
            visible_start,
            visible_end,
        }
    }

    /// Restrict what presenters show to `[start, end]` (inclusive).
    pub fn with_visible_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.visible_start = start;
        self.visible_end = end;
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn params(&self) -> SignalParams {
        self.params
    }

    /// Every computed row, including any history before the visible range.
    pub fn rows(&self) -> &[AveragedBar] {
        &self.rows
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn visible_range(&self) -> (NaiveDate, NaiveDate) {
        (self.visible_start, self.visible_end)
    }

    /// Rows and signals whose date lies in the visible range.
    pub fn visible_rows(&self) -> impl Iterator<Item = (&AveragedBar, Signal)> + '_ {
        let (start, end) = self.visible_range();
        self.rows
            .iter()
            .zip(self.signals.iter().copied())
            .filter(move |(row, _)| row.bar.date >= start && row.bar.date <= end)
    }

    /// Buy and Sell points in the visible range. Hold bars have no marker.
    pub fn markers(&self) -> Vec<Marker> {
        self.visible_rows()
            .filter(|(_, signal)| *signal != Signal::Hold)
            .map(|(row, signal)| Marker {
                date: row.bar.date,
                price: row.short_ma,
                signal,
            })
            .collect()
    }

    pub fn summary(&self) -> SignalSummary {
        let mut summary = SignalSummary::default();
        for (row, signal) in self.visible_rows() {
            summary.bars += 1;
            match signal {
                Signal::Buy => summary.buy += 1,
                Signal::Sell => summary.sell += 1,
                Signal::Hold => summary.hold += 1,
            }
            summary.last = Some(signal);
            summary.last_date = Some(row.bar.date);
        }
        summary
    }
}
