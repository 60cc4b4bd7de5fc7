//! Expanding-window Simple Moving Average.
//!
//! Trailing mean of close prices over `period` bars. Before `period` bars have
//! elapsed the mean covers every bar so far, so there are no leading NaNs:
//! the first value is the first close.

use super::Indicator;
use crate::domain::{Bar, MovingAverageWindow};

#[derive(Debug, Clone)]
pub struct ExpandingSma {
    period: usize,
    name: String,
}

impl ExpandingSma {
    pub fn new(window: MovingAverageWindow) -> Self {
        let period = window.get();
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

/// Mean of a non-empty slice, measured from its first element.
///
/// Deviations from the pivot are exact zeros for repeated values, so a run of
/// identical closes averages back to exactly that close.
fn pivot_mean(window: &[f64]) -> f64 {
    let pivot = window[0];
    let deviation: f64 = window.iter().map(|&x| x - pivot).sum();
    pivot + deviation / window.len() as f64
}

impl Indicator for ExpandingSma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        (0..closes.len())
            .map(|i| {
                let start = (i + 1).saturating_sub(self.period);
                pivot_mean(&closes[start..=i])
            })
            .collect()
    }
}
