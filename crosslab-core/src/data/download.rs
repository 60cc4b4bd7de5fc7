//! Multi-symbol download into the Parquet cache, with progress reporting.

use chrono::NaiveDate;

use super::cache::{CoverageResult, ParquetCache};
use super::provider::{DataError, DownloadProgress, SeriesLoader};
use crate::domain::validate_bars;

/// Fetch each symbol from `loader` and cache it.
///
/// Symbols already covered are skipped unless `force`. Fetched bars must pass
/// the same checks the engine applies before they are merged into whatever is
/// already cached; a range disjoint from the cache is widened to bridge the
/// gap. Stops early if the loader becomes unavailable (circuit breaker),
/// marking the rest failed.
pub fn download_symbols(
    loader: &dyn SeriesLoader,
    cache: &ParquetCache,
    symbols: &[&str],
    start: NaiveDate,
    end: NaiveDate,
    force: bool,
    progress: &dyn DownloadProgress,
) -> DownloadSummary {
    let total = symbols.len();
    let mut succeeded = 0;
    let mut failed = 0;
    let mut errors: Vec<(String, DataError)> = Vec::new();

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_start(symbol, i, total);

        if !force && cache.covers_range(symbol, start, end) == CoverageResult::FullyCovered {
            tracing::debug!(symbol, "already cached, skipping");
            progress.on_complete(symbol, i, total, &Ok(()));
            succeeded += 1;
            continue;
        }

        let result = download_single(loader, cache, symbol, start, end);
        progress.on_complete(symbol, i, total, &result);

        match result {
            Ok(()) => succeeded += 1,
            Err(e) => {
                errors.push((symbol.to_string(), e));
                failed += 1;
            }
        }

        if !loader.is_available() {
            for sym in &symbols[(i + 1)..] {
                errors.push((sym.to_string(), DataError::CircuitBreakerTripped));
                failed += 1;
            }
            break;
        }
    }

    progress.on_batch_complete(succeeded, failed, total);

    DownloadSummary {
        total,
        succeeded,
        failed,
        errors,
    }
}

fn download_single(
    loader: &dyn SeriesLoader,
    cache: &ParquetCache,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), DataError> {
    let (start, end) = cache.bridged_range(symbol, start, end);
    let fetched = loader.fetch(symbol, start, end)?;
    if fetched.bars.is_empty() {
        return Err(DataError::EmptyRange {
            symbol: symbol.to_string(),
            start,
            end,
        });
    }
    validate_bars(&fetched.bars)
        .map_err(|e| DataError::Other(format!("rejected bars for {symbol}: {e}")))?;
    cache.merge_write(symbol, &fetched.bars, fetched.source, start, end)
}

/// Summary of a batch download.
#[derive(Debug)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(String, DataError)>,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{DataSource, FetchResult};
    use crate::data::synthetic::generate_bars;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Fails for "BAD"; after a failure, optionally reports itself unavailable.
    struct FlakyLoader {
        trip_on_failure: bool,
        tripped: AtomicBool,
    }

    impl FlakyLoader {
        fn new(trip_on_failure: bool) -> Self {
            Self {
                trip_on_failure,
                tripped: AtomicBool::new(false),
            }
        }
    }

    impl SeriesLoader for FlakyLoader {
        fn name(&self) -> &str {
            "flaky"
        }

        fn fetch(
            &self,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<FetchResult, DataError> {
            if symbol == "BAD" {
                if self.trip_on_failure {
                    self.tripped.store(true, Ordering::SeqCst);
                }
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }
            Ok(FetchResult {
                symbol: symbol.to_string(),
                bars: generate_bars(symbol, start, end),
                source: DataSource::YahooFinance,
            })
        }

        fn is_available(&self) -> bool {
            !self.tripped.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl DownloadProgress for RecordingProgress {
        fn on_start(&self, symbol: &str, _index: usize, _total: usize) {
            self.events.lock().unwrap().push(format!("start {symbol}"));
        }

        fn on_complete(
            &self,
            symbol: &str,
            _index: usize,
            _total: usize,
            result: &Result<(), DataError>,
        ) {
            let tag = if result.is_ok() { "ok" } else { "err" };
            self.events.lock().unwrap().push(format!("{tag} {symbol}"));
        }

        fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {succeeded}/{total} ({failed} failed)"));
        }
    }

    #[test]
    fn downloads_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let progress = RecordingProgress::default();

        let summary = download_symbols(
            &FlakyLoader::new(false),
            &cache,
            &["SPY", "BAD", "QQQ"],
            d(2023, 1, 1),
            d(2023, 1, 31),
            false,
            &progress,
        );

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_succeeded());
        assert_eq!(summary.errors[0].0, "BAD");
        assert!(cache.get_meta("SPY").is_some());
        assert!(cache.get_meta("QQQ").is_some());
        assert_eq!(
            progress.events.lock().unwrap().last().unwrap(),
            "done 2/3 (1 failed)"
        );
    }

    #[test]
    fn unavailable_loader_stops_batch() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());

        let summary = download_symbols(
            &FlakyLoader::new(true),
            &cache,
            &["BAD", "SPY", "QQQ"],
            d(2023, 1, 1),
            d(2023, 1, 31),
            false,
            &RecordingProgress::default(),
        );

        assert_eq!(summary.failed, 3);
        assert!(matches!(summary.errors[1].1, DataError::CircuitBreakerTripped));
        assert!(cache.get_meta("SPY").is_none());
    }

    #[test]
    fn covered_symbols_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let loader = FlakyLoader::new(false);
        let progress = RecordingProgress::default();

        download_symbols(&loader, &cache, &["SPY"], d(2023, 1, 1), d(2023, 1, 31), false, &progress);
        let cached_at = cache.get_meta("SPY").unwrap().cached_at;

        download_symbols(&loader, &cache, &["SPY"], d(2023, 1, 1), d(2023, 1, 31), false, &progress);
        assert_eq!(cache.get_meta("SPY").unwrap().cached_at, cached_at);
    }

    #[test]
    fn later_download_keeps_older_years() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let loader = FlakyLoader::new(false);
        let progress = RecordingProgress::default();

        download_symbols(&loader, &cache, &["SPY"], d(2020, 1, 1), d(2022, 12, 31), false, &progress);
        download_symbols(&loader, &cache, &["SPY"], d(2023, 1, 1), d(2023, 6, 30), false, &progress);

        let partition = dir.path().join("symbol=SPY");
        for year in 2020..=2023 {
            assert!(partition.join(format!("{year}.parquet")).is_file(), "{year} missing");
        }
        let meta = cache.get_meta("SPY").unwrap();
        assert_eq!((meta.start_date, meta.end_date), (d(2020, 1, 1), d(2023, 6, 30)));
        assert_eq!(
            cache.load("SPY").unwrap(),
            generate_bars("SPY", d(2020, 1, 1), d(2023, 6, 30))
        );
    }

    #[test]
    fn disjoint_download_bridges_the_gap() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let loader = FlakyLoader::new(false);
        let progress = RecordingProgress::default();

        download_symbols(&loader, &cache, &["SPY"], d(2020, 1, 1), d(2020, 12, 31), false, &progress);
        download_symbols(&loader, &cache, &["SPY"], d(2023, 1, 1), d(2023, 6, 30), false, &progress);

        assert_eq!(
            cache.covers_range("SPY", d(2020, 1, 1), d(2023, 6, 30)),
            CoverageResult::FullyCovered
        );
        assert_eq!(
            cache.load_range("SPY", d(2021, 6, 1), d(2021, 6, 30)).unwrap(),
            generate_bars("SPY", d(2021, 6, 1), d(2021, 6, 30))
        );
    }
}
