//! Loader → engine → report.
//!
//! Turns a request into a report. Loading and evaluation are separate steps
//! so an interactive front end can fetch once and re-evaluate on every
//! parameter change; each evaluation is a full, independent engine run.

use chrono::{Days, NaiveDate};

use crate::data::SeriesLoader;
use crate::domain::Series;
use crate::engine::{SignalEngine, SignalRequest};
use crate::error::{EngineError, InvalidArgument};
use crate::report::SignalReport;

/// Run `request` against bars for exactly `[start, end]`.
pub fn run(loader: &dyn SeriesLoader, request: &SignalRequest) -> Result<SignalReport, EngineError> {
    run_padded(loader, request, 0)
}

/// Run `request`, fetching `history_padding_days` extra calendar days before
/// the start so the averages at the start of the visible range include
/// earlier closes. The report's visible range is still `[start, end]`.
pub fn run_padded(
    loader: &dyn SeriesLoader,
    request: &SignalRequest,
    history_padding_days: u32,
) -> Result<SignalReport, EngineError> {
    let series = load_series(loader, request, history_padding_days)?;
    evaluate(&series, request)
}

/// Fetch and validate the bars `request` needs, padding included.
pub fn load_series(
    loader: &dyn SeriesLoader,
    request: &SignalRequest,
    history_padding_days: u32,
) -> Result<Series, EngineError> {
    let fetch_start = padded_start(request.start, history_padding_days);

    tracing::info!(
        symbol = %request.symbol,
        loader = loader.name(),
        start = %fetch_start,
        end = %request.end,
        "loading series"
    );
    let fetched = loader.fetch(&request.symbol, fetch_start, request.end)?;
    let source = fetched.source;
    let series = fetched.into_series()?;
    tracing::debug!(
        symbol = series.symbol(),
        bars = series.len(),
        first = %series.first_date(),
        last = %series.last_date(),
        ?source,
        "series validated"
    );
    Ok(series)
}

/// Run the engine over an already loaded series with `request`'s windows and
/// restrict the report to `request`'s date range.
///
/// Fails with `EmptySeries` when no bar falls inside that range.
pub fn evaluate(series: &Series, request: &SignalRequest) -> Result<SignalReport, EngineError> {
    let report = SignalEngine::new(request.params)
        .run(series)?
        .with_visible_range(request.start, request.end);

    if report.visible_rows().next().is_none() {
        return Err(InvalidArgument::EmptySeries.into());
    }

    let summary = report.summary();
    tracing::debug!(
        symbol = report.symbol(),
        bars = summary.bars,
        buy = summary.buy,
        sell = summary.sell,
        hold = summary.hold,
        "signals ready"
    );
    Ok(report)
}

fn padded_start(start: NaiveDate, days: u32) -> NaiveDate {
    start
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataError, DataSource, FetchResult, SyntheticLoader};
    use crate::domain::Bar;
    use crate::signal::Signal;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Serves a fixed bar list, filtered to the requested range.
    struct FixedLoader(Vec<Bar>);

    impl SeriesLoader for FixedLoader {
        fn name(&self) -> &str {
            "fixed"
        }

        fn fetch(
            &self,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<FetchResult, DataError> {
            Ok(FetchResult {
                symbol: symbol.to_string(),
                bars: self
                    .0
                    .iter()
                    .filter(|b| b.date >= start && b.date <= end)
                    .cloned()
                    .collect(),
                source: DataSource::CsvImport,
            })
        }
    }

    struct DownLoader;

    impl SeriesLoader for DownLoader {
        fn name(&self) -> &str {
            "down"
        }

        fn fetch(&self, _: &str, _: NaiveDate, _: NaiveDate) -> Result<FetchResult, DataError> {
            Err(DataError::NetworkUnreachable("connection refused".into()))
        }
    }

    fn bars(closes: &[f64]) -> Vec<Bar> {
        closes
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
            .collect()
    }

    #[test]
    fn worked_example_end_to_end() {
        let loader = FixedLoader(bars(&[10.0, 12.0, 14.0, 12.0, 10.0]));
        let request = SignalRequest::new("TEST", d(2024, 1, 1), d(2024, 1, 5), 2, 3).unwrap();
        let report = run(&loader, &request).unwrap();
        assert_eq!(
            report.signals(),
            &[Signal::Hold, Signal::Hold, Signal::Buy, Signal::Buy, Signal::Sell]
        );
    }

    #[test]
    fn empty_fetch_is_invalid_argument() {
        let loader = FixedLoader(bars(&[10.0, 11.0]));
        let request = SignalRequest::new("TEST", d(2025, 1, 1), d(2025, 1, 5), 2, 3).unwrap();
        let err = run(&loader, &request).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(InvalidArgument::EmptySeries)));
    }

    #[test]
    fn loader_failure_is_data_unavailable() {
        let request = SignalRequest::new("TEST", d(2024, 1, 1), d(2024, 1, 5), 2, 3).unwrap();
        let err = run(&DownLoader, &request).unwrap_err();
        assert!(matches!(err, EngineError::DataUnavailable(DataError::NetworkUnreachable(_))));
        assert_eq!(err.category(), "DATA");
    }

    #[test]
    fn unordered_bars_are_rejected() {
        let mut data = bars(&[10.0, 11.0, 12.0]);
        data.swap(0, 2);
        let request = SignalRequest::new("TEST", d(2024, 1, 1), d(2024, 1, 3), 1, 2).unwrap();
        let err = run(&FixedLoader(data), &request).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidArgument(InvalidArgument::NonAscendingDates { .. })
        ));
    }

    #[test]
    fn padding_feeds_history_but_keeps_visible_range() {
        let loader = FixedLoader(bars(&[10.0, 12.0, 14.0, 12.0, 10.0]));
        // Visible range is the last two bars; padding reaches back to the first.
        let request = SignalRequest::new("TEST", d(2024, 1, 4), d(2024, 1, 5), 2, 3).unwrap();

        let unpadded = run(&loader, &request).unwrap();
        let padded = run_padded(&loader, &request, 3).unwrap();

        assert_eq!(unpadded.len(), 2);
        assert_eq!(padded.len(), 5);
        assert_eq!(padded.visible_rows().count(), 2);

        let visible: Vec<Signal> = padded.visible_rows().map(|(_, s)| s).collect();
        assert_eq!(visible, vec![Signal::Buy, Signal::Sell]);
        // Without history the first visible bar has both MAs equal to its close.
        assert_eq!(unpadded.signals()[0], Signal::Hold);
    }

    #[test]
    fn synthetic_loader_runs_with_defaults() {
        let request = SignalRequest::new("DEMO", d(2023, 1, 1), d(2024, 1, 1), 22, 44).unwrap();
        let report = run(&SyntheticLoader::new(), &request).unwrap();
        assert!(report.len() > 200);
        assert_eq!(report.summary().bars, report.len());
    }

    #[test]
    fn evaluate_reuses_a_loaded_series() {
        let loader = FixedLoader(bars(&[10.0, 12.0, 14.0, 12.0, 10.0]));
        let request = SignalRequest::new("TEST", d(2024, 1, 1), d(2024, 1, 5), 2, 3).unwrap();
        let series = load_series(&loader, &request, 0).unwrap();

        let swapped = request.with_params(crate::engine::SignalParams::new(3, 2).unwrap());
        let report = evaluate(&series, &swapped).unwrap();
        assert_eq!(
            report.signals(),
            &[Signal::Hold, Signal::Hold, Signal::Sell, Signal::Sell, Signal::Buy]
        );
        assert_eq!(evaluate(&series, &request).unwrap(), run(&loader, &request).unwrap());
    }

    #[test]
    fn padding_saturates_at_min_date() {
        assert_eq!(padded_start(NaiveDate::MIN, 10), NaiveDate::MIN);
        assert_eq!(padded_start(d(2024, 1, 10), 9), d(2024, 1, 1));
    }
}
