//! Synthetic series loader for offline development and demos.
//!
//! Produces a weekday-only random walk starting at 100.0. The RNG is seeded
//! from a BLAKE3 hash of the symbol, so the same symbol and range always give
//! the same bars. Results are tagged `DataSource::Synthetic`.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, DataSource, FetchResult, SeriesLoader};
use crate::domain::Bar;

/// Earliest date the walk starts from, so a symbol's prices do not depend on
/// the requested start.
const WALK_ORIGIN: (i32, u32, u32) = (2000, 1, 3);

#[derive(Debug, Clone, Default)]
pub struct SyntheticLoader;

impl SyntheticLoader {
    pub fn new() -> Self {
        Self
    }
}

/// Generate synthetic bars for `symbol` covering `[start, end]`.
pub fn generate_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let origin = NaiveDate::from_ymd_opt(WALK_ORIGIN.0, WALK_ORIGIN.1, WALK_ORIGIN.2)
        .unwrap_or(start)
        .min(start);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = origin;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        if current >= start {
            bars.push(Bar {
                date: current,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

impl SeriesLoader for SyntheticLoader {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        tracing::warn!(symbol, "generating synthetic data; results are not market prices");
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars: generate_bars(symbol, start, end),
            source: DataSource::Synthetic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekdays_only_and_sane() {
        let bars = generate_bars("SPY", d(2024, 1, 1), d(2024, 1, 31));
        assert_eq!(bars.len(), 23);
        assert!(bars
            .iter()
            .all(|b| !matches!(b.date.weekday(), Weekday::Sat | Weekday::Sun)));
        assert!(bars.iter().all(Bar::is_sane));
        assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn deterministic_per_symbol() {
        let a = generate_bars("SPY", d(2024, 1, 1), d(2024, 3, 1));
        let b = generate_bars("SPY", d(2024, 1, 1), d(2024, 3, 1));
        let c = generate_bars("QQQ", d(2024, 1, 1), d(2024, 3, 1));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn sub_range_is_a_slice_of_wider_range() {
        let wide = generate_bars("SPY", d(2024, 1, 1), d(2024, 2, 29));
        let narrow = generate_bars("SPY", d(2024, 2, 1), d(2024, 2, 29));
        let tail: Vec<_> = wide.into_iter().filter(|b| b.date >= d(2024, 2, 1)).collect();
        assert_eq!(tail, narrow);
    }

    #[test]
    fn fetch_tags_source() {
        let fetched = SyntheticLoader::new()
            .fetch("DEMO", d(2024, 1, 1), d(2024, 1, 5))
            .unwrap();
        assert_eq!(fetched.source, DataSource::Synthetic);
        assert_eq!(fetched.bars.len(), 5);
    }
}
