//! Moving-average crossover signal: per-bar Buy/Sell/Hold classification.
//!
//! Buy when the short MA sits above the long MA, Sell when below, Hold when
//! they are exactly equal. Each bar is classified on its own two averages:
//! no lookback, no hysteresis, no de-duplication of repeated signals.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::domain::{validate_bars, Bar, MovingAverageWindow, WindowRole};
use crate::error::InvalidArgument;
use crate::indicators::{ExpandingSma, Indicator};

/// Discrete per-bar signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Classify one bar from its short and long averages.
    pub fn classify(short_ma: f64, long_ma: f64) -> Self {
        match short_ma.partial_cmp(&long_ma) {
            Some(Ordering::Greater) => Signal::Buy,
            Some(Ordering::Less) => Signal::Sell,
            _ => Signal::Hold,
        }
    }

    /// Numeric encoding used in exports: Buy = +1, Sell = -1, Hold = 0.
    pub fn code(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Sell => -1,
            Signal::Hold => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A bar with its short and long moving averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragedBar {
    pub bar: Bar,
    pub short_ma: f64,
    pub long_ma: f64,
}

impl AveragedBar {
    pub fn signal(&self) -> Signal {
        Signal::classify(self.short_ma, self.long_ma)
    }
}

/// Attach short and long expanding-window SMAs of close to every bar.
///
/// Preconditions (checked before any computation, no partial result):
/// non-empty, strictly ascending dates, positive finite closes, both windows
/// >= 1. A window longer than the series is fine: the mean just covers every
/// bar so far.
pub fn compute_moving_averages(
    bars: &[Bar],
    short_window: usize,
    long_window: usize,
) -> Result<Vec<AveragedBar>, InvalidArgument> {
    let short = MovingAverageWindow::new(short_window, WindowRole::Short)?;
    let long = MovingAverageWindow::new(long_window, WindowRole::Long)?;
    validate_bars(bars)?;

    let short_ma = ExpandingSma::new(short).compute(bars);
    let long_ma = ExpandingSma::new(long).compute(bars);

    Ok(bars
        .iter()
        .zip(short_ma)
        .zip(long_ma)
        .map(|((bar, short_ma), long_ma)| AveragedBar {
            bar: bar.clone(),
            short_ma,
            long_ma,
        })
        .collect())
}

/// Classify every averaged bar. Same length and order as the input.
pub fn generate_signals(averaged: &[AveragedBar]) -> Vec<Signal> {
    averaged.iter().map(AveragedBar::signal).collect()
}
