//! Application state: single-owner, main-thread only.
//!
//! The series is loaded once at startup. Every slider change builds a new
//! request and re-runs the engine over that series in full.

use crosslab_core::engine::control_range;
use crosslab_core::error::EngineError;
use crosslab_core::{pipeline, Series, SignalParams, SignalReport, SignalRequest, WindowRole};

/// An error as shown in place of the chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorView {
    pub category: &'static str,
    pub message: String,
}

impl From<&EngineError> for ErrorView {
    fn from(e: &EngineError) -> Self {
        Self {
            category: e.category(),
            message: e.to_string(),
        }
    }
}

/// What the chart area shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChartView {
    /// Close, short MA and long MA as lines.
    #[default]
    Lines,
    /// OHLC candles with both MAs drawn over them.
    Candles,
}

pub struct App {
    request: SignalRequest,
    initial_params: SignalParams,
    series: Result<Series, ErrorView>,
    outcome: Result<SignalReport, ErrorView>,
    /// Slider that receives adjustments.
    pub focus: WindowRole,
    pub view: ChartView,
    pub running: bool,
}

impl App {
    pub fn new(request: SignalRequest, loaded: Result<Series, EngineError>) -> Self {
        let series = loaded.map_err(|e| ErrorView::from(&e));
        let mut app = Self {
            initial_params: request.params,
            request,
            outcome: Err(ErrorView {
                category: "INPUT",
                message: "not computed".into(),
            }),
            series,
            focus: WindowRole::Short,
            view: ChartView::default(),
            running: true,
        };
        app.recompute();
        app
    }

    pub fn request(&self) -> &SignalRequest {
        &self.request
    }

    pub fn outcome(&self) -> Result<&SignalReport, &ErrorView> {
        self.outcome.as_ref()
    }

    pub fn window(&self, role: WindowRole) -> usize {
        self.request.params.window(role).get()
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            WindowRole::Short => WindowRole::Long,
            WindowRole::Long => WindowRole::Short,
        };
    }

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            ChartView::Lines => ChartView::Candles,
            ChartView::Candles => ChartView::Lines,
        };
    }

    /// Move the focused slider by `delta`, clamped to its range.
    pub fn adjust(&mut self, delta: i64) {
        let current = self.window(self.focus) as i64;
        let range = control_range(self.focus);
        let next = (current + delta).clamp(*range.start() as i64, *range.end() as i64) as usize;
        self.set_window(self.focus, next);
    }

    pub fn set_window(&mut self, role: WindowRole, value: usize) {
        if self.window(role) == value {
            return;
        }
        let (short, long) = match role {
            WindowRole::Short => (value, self.window(WindowRole::Long)),
            WindowRole::Long => (self.window(WindowRole::Short), value),
        };
        match SignalParams::within_control_ranges(short, long) {
            Ok(params) => {
                self.request = self.request.with_params(params);
                self.recompute();
            }
            Err(e) => {
                self.outcome = Err(ErrorView::from(&EngineError::from(e)));
            }
        }
    }

    /// Restore the windows the app started with.
    pub fn reset(&mut self) {
        self.request = self.request.with_params(self.initial_params);
        self.recompute();
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    fn recompute(&mut self) {
        self.outcome = match &self.series {
            Ok(series) => {
                pipeline::evaluate(series, &self.request).map_err(|e| ErrorView::from(&e))
            }
            Err(e) => Err(e.clone()),
        };
        if let Err(e) = &self.outcome {
            tracing::warn!(category = e.category, "{}", e.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crosslab_core::data::DataError;
    use crosslab_core::{Bar, Signal};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn worked_example() -> App {
        let bars = [10.0, 12.0, 14.0, 12.0, 10.0]
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: d(2024, 1, 1) + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1,
            })
            .collect();
        let request = SignalRequest::new("TEST", d(2024, 1, 1), d(2024, 1, 5), 2, 3).unwrap();
        App::new(request, Ok(Series::new("TEST", bars).unwrap()))
    }

    #[test]
    fn computes_on_start() {
        let app = worked_example();
        let report = app.outcome().unwrap();
        assert_eq!(
            report.signals(),
            &[Signal::Hold, Signal::Hold, Signal::Buy, Signal::Buy, Signal::Sell]
        );
    }

    #[test]
    fn slider_change_recomputes() {
        let mut app = worked_example();
        app.adjust(1); // short 2 -> 3, equal to long
        assert_eq!(app.window(WindowRole::Short), 3);
        assert!(app
            .outcome()
            .unwrap()
            .signals()
            .iter()
            .all(|s| *s == Signal::Hold));
    }

    #[test]
    fn adjust_clamps_to_control_range() {
        let mut app = worked_example();
        app.adjust(-10);
        assert_eq!(app.window(WindowRole::Short), 1);
        app.adjust(500);
        assert_eq!(app.window(WindowRole::Short), 100);

        app.toggle_focus();
        app.adjust(1000);
        assert_eq!(app.window(WindowRole::Long), 200);
        assert!(app.outcome().is_ok());
    }

    #[test]
    fn reset_restores_initial_windows() {
        let mut app = worked_example();
        app.adjust(10);
        app.toggle_focus();
        app.adjust(-2);
        app.reset();
        assert_eq!(app.window(WindowRole::Short), 2);
        assert_eq!(app.window(WindowRole::Long), 3);
        assert_eq!(app.outcome().unwrap().signals()[4], Signal::Sell);
    }

    #[test]
    fn load_failure_is_shown_and_survives_changes() {
        let request = SignalRequest::new("X", d(2024, 1, 1), d(2024, 1, 5), 2, 3).unwrap();
        let mut app = App::new(
            request,
            Err(DataError::SymbolNotFound { symbol: "X".into() }.into()),
        );
        let err = app.outcome().unwrap_err();
        assert_eq!(err.category, "DATA");
        assert!(err.message.contains("symbol not found"));

        app.adjust(1);
        assert_eq!(app.outcome().unwrap_err().category, "DATA");
    }

    #[test]
    fn view_toggle_keeps_outcome() {
        let mut app = worked_example();
        assert_eq!(app.view, ChartView::Lines);
        app.toggle_view();
        assert_eq!(app.view, ChartView::Candles);
        assert_eq!(app.outcome().unwrap().signals()[4], Signal::Sell);
        app.toggle_view();
        assert_eq!(app.view, ChartView::Lines);
    }

    #[test]
    fn quit_stops_loop() {
        let mut app = worked_example();
        app.quit();
        assert!(!app.running);
    }
}
