//! SignalEngine and its parameter objects.
//!
//! `SignalParams` carries the two windows; `SignalRequest` is everything a
//! control surface supplies (symbol, date range, windows) with the ranges the
//! sliders allow. The engine itself only requires windows >= 1.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::domain::{MovingAverageWindow, Series, WindowRole};
use crate::error::InvalidArgument;
use crate::report::SignalReport;
use crate::signal::{compute_moving_averages, generate_signals};

/// Allowed short window on the control surface.
pub const SHORT_WINDOW_RANGE: RangeInclusive<usize> = 1..=100;
/// Allowed long window on the control surface.
pub const LONG_WINDOW_RANGE: RangeInclusive<usize> = 1..=200;

pub const DEFAULT_SHORT_WINDOW: usize = 22;
pub const DEFAULT_LONG_WINDOW: usize = 44;

/// Short and long window lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalParams {
    pub short_window: MovingAverageWindow,
    pub long_window: MovingAverageWindow,
}

impl SignalParams {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, InvalidArgument> {
        Ok(Self {
            short_window: MovingAverageWindow::new(short_window, WindowRole::Short)?,
            long_window: MovingAverageWindow::new(long_window, WindowRole::Long)?,
        })
    }

    /// Same as `new`, but also enforces the slider ranges.
    pub fn within_control_ranges(
        short_window: usize,
        long_window: usize,
    ) -> Result<Self, InvalidArgument> {
        check_range(WindowRole::Short, short_window, &SHORT_WINDOW_RANGE)?;
        check_range(WindowRole::Long, long_window, &LONG_WINDOW_RANGE)?;
        Self::new(short_window, long_window)
    }

    pub fn window(&self, role: WindowRole) -> MovingAverageWindow {
        match role {
            WindowRole::Short => self.short_window,
            WindowRole::Long => self.long_window,
        }
    }
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            short_window: MovingAverageWindow::new_const(DEFAULT_SHORT_WINDOW),
            long_window: MovingAverageWindow::new_const(DEFAULT_LONG_WINDOW),
        }
    }
}

/// Allowed range for a window role on the control surface.
pub fn control_range(role: WindowRole) -> RangeInclusive<usize> {
    match role {
        WindowRole::Short => SHORT_WINDOW_RANGE,
        WindowRole::Long => LONG_WINDOW_RANGE,
    }
}

fn check_range(
    role: WindowRole,
    value: usize,
    range: &RangeInclusive<usize>,
) -> Result<(), InvalidArgument> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(InvalidArgument::WindowOutOfRange {
            role,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// The five user-facing parameters of a signal run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub params: SignalParams,
}

impl SignalRequest {
    pub fn new(
        symbol: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        short_window: usize,
        long_window: usize,
    ) -> Result<Self, InvalidArgument> {
        let symbol = symbol.into().trim().to_string();
        if symbol.is_empty() {
            return Err(InvalidArgument::EmptySymbol);
        }
        if start > end {
            return Err(InvalidArgument::InvalidDateRange { start, end });
        }
        let params = SignalParams::within_control_ranges(short_window, long_window)?;
        Ok(Self {
            symbol,
            start,
            end,
            params,
        })
    }

    /// Copy of this request with different windows (slider change).
    pub fn with_params(&self, params: SignalParams) -> Self {
        Self {
            params,
            ..self.clone()
        }
    }
}

/// Stateless moving-average crossover engine.
///
/// Every `run` is an independent full pass; nothing is cached between runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalEngine {
    params: SignalParams,
}

impl SignalEngine {
    pub fn new(params: SignalParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> SignalParams {
        self.params
    }

    /// Averages and signals for every bar of `series`.
    ///
    /// The visible range of the returned report covers the whole series;
    /// callers narrow it with [`SignalReport::with_visible_range`].
    pub fn run(&self, series: &Series) -> Result<SignalReport, InvalidArgument> {
        let averaged = compute_moving_averages(
            series.bars(),
            self.params.short_window.get(),
            self.params.long_window.get(),
        )?;
        let signals = generate_signals(&averaged);

        tracing::debug!(
            symbol = series.symbol(),
            bars = averaged.len(),
            short = %self.params.short_window,
            long = %self.params.long_window,
            "computed crossover signals"
        );

        Ok(SignalReport::new(
            series.symbol(),
            self.params,
            averaged,
            signals,
        ))
    }
}
