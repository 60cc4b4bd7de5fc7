//! On-disk bar cache: one Parquet file per symbol and calendar year.
//!
//! ```text
//! {cache_dir}/symbol=WIPRO.NS/2023.parquet
//! {cache_dir}/symbol=WIPRO.NS/2024.parquet
//! {cache_dir}/symbol=WIPRO.NS/meta.json
//! ```
//!
//! Year files are written to `.tmp` and renamed into place. `meta.json`
//! records the covered date range, a content hash and the source the bars
//! came from.
//!
//! A year file that fails to read back (bad schema, zero rows) is renamed to
//! `.quarantined`. A quarantine, or bars whose hash no longer matches the
//! sidecar, drops `meta.json` so the symbol reads as uncached and the next
//! online fetch goes upstream.
//!
//! Only market data lives here. Signals are always recomputed.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::provider::{DataError, DataSource};
use crate::domain::Bar;

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];
const META_FILE: &str = "meta.json";

/// Sidecar describing what is cached for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub symbol: String,
    /// First day the cached bars answer for. May precede the first bar.
    pub start_date: NaiveDate,
    /// Last day the cached bars answer for. May follow the last bar.
    pub end_date: NaiveDate,
    pub bar_count: usize,
    pub data_hash: String,
    pub source: DataSource,
    pub cached_at: chrono::NaiveDateTime,
}

/// One row of `crosslab cache status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatus {
    pub symbol: String,
    pub cached: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub bar_count: Option<usize>,
}

impl CacheStatus {
    fn from_meta(symbol: &str, meta: Option<CacheMeta>) -> Self {
        match meta {
            Some(m) => Self {
                symbol: symbol.to_string(),
                cached: true,
                start_date: Some(m.start_date),
                end_date: Some(m.end_date),
                bar_count: Some(m.bar_count),
            },
            None => Self {
                symbol: symbol.to_string(),
                cached: false,
                start_date: None,
                end_date: None,
                bar_count: None,
            },
        }
    }
}

/// How much of a requested range the cache can answer.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverageResult {
    NotCached,
    FullyCovered,
    PartiallyCovered {
        cached_start: NaiveDate,
        cached_end: NaiveDate,
    },
}

#[derive(Debug, Clone)]
pub struct ParquetCache {
    root: PathBuf,
}

impl ParquetCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.root
    }

    fn partition(&self, symbol: &str) -> PathBuf {
        self.root.join(format!("symbol={symbol}"))
    }

    /// Store `bars` as the full cached history of `symbol`; the covered range
    /// is exactly the first to last bar date.
    pub fn write(&self, symbol: &str, bars: &[Bar], source: DataSource) -> Result<(), DataError> {
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => {
                self.write_covering(symbol, bars, source, first.date, last.date)
            }
            _ => Err(DataError::CacheError(format!("refusing to cache zero bars for {symbol}"))),
        }
    }

    /// Range to fetch so that `[start, end]` joins the cached range without a
    /// gap. A request already touching the cached range is returned as is.
    pub fn bridged_range(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self.get_meta(symbol) {
            Some(meta) if start > next_day(meta.end_date) => (next_day(meta.end_date), end),
            Some(meta) if next_day(end) < meta.start_date => (start, prev_day(meta.start_date)),
            _ => (start, end),
        }
    }

    /// Fold `bars` fetched for `[start, end]` into the cached history.
    ///
    /// A cached range that overlaps or touches the request is merged, fresh
    /// bars winning on the same date. A disjoint or unreadable one is
    /// replaced, so the recorded coverage never spans a gap that was never
    /// fetched. Callers that want to keep a disjoint history fetch
    /// [`bridged_range`](Self::bridged_range) instead.
    pub fn merge_write(
        &self,
        symbol: &str,
        bars: &[Bar],
        source: DataSource,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(), DataError> {
        let merged = match self.get_meta(symbol) {
            Some(meta) if meta.start_date <= next_day(end) && start <= next_day(meta.end_date) => {
                match self.load(symbol) {
                    Ok(existing) => Some((
                        merge_bars(existing, bars),
                        meta.start_date.min(start),
                        meta.end_date.max(end),
                    )),
                    Err(e) => {
                        tracing::warn!(symbol, error = %e, "replacing unreadable cached bars");
                        None
                    }
                }
            }
            Some(meta) => {
                tracing::warn!(
                    symbol,
                    cached_start = %meta.start_date,
                    cached_end = %meta.end_date,
                    "replacing disjoint cached range"
                );
                None
            }
            None => None,
        };

        match merged {
            Some((bars, start, end)) => self.write_covering(symbol, &bars, source, start, end),
            None => self.write_covering(symbol, bars, source, start, end),
        }
    }

    /// Store `bars` fetched for `[start, end]`, replacing whatever was cached.
    ///
    /// The sidecar's range is the union of the request and the bar dates, so
    /// a request that starts on a weekend or holiday still reads as covered.
    /// Year files left over from an earlier, wider history are deleted.
    pub fn write_covering(
        &self,
        symbol: &str,
        bars: &[Bar],
        source: DataSource,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(), DataError> {
        let mut bars = bars.to_vec();
        bars.sort_by_key(|b| b.date);
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            return Err(DataError::CacheError(format!("refusing to cache zero bars for {symbol}")));
        };

        let dir = self.partition(symbol);
        fs::create_dir_all(&dir)
            .map_err(|e| DataError::CacheError(format!("{}: {e}", dir.display())))?;

        let mut years: BTreeMap<i32, Vec<&Bar>> = BTreeMap::new();
        for bar in &bars {
            years.entry(bar.date.year()).or_default().push(bar);
        }

        for stale in self.year_files(symbol)? {
            if year_of(&stale).is_some_and(|y| !years.contains_key(&y)) {
                fs::remove_file(&stale)
                    .map_err(|e| DataError::CacheError(format!("{}: {e}", stale.display())))?;
            }
        }

        for (year, chunk) in &years {
            let target = dir.join(format!("{year}.parquet"));
            write_atomically(&target, &mut to_frame(chunk)?)?;
        }

        let meta = CacheMeta {
            symbol: symbol.to_string(),
            start_date: start.min(first.date),
            end_date: end.max(last.date),
            bar_count: bars.len(),
            data_hash: hash_bars(&bars),
            source,
            cached_at: chrono::Local::now().naive_local(),
        };
        let json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("encode {META_FILE}: {e}")))?;
        fs::write(dir.join(META_FILE), json)
            .map_err(|e| DataError::CacheError(format!("write {META_FILE}: {e}")))?;

        tracing::info!(symbol, bars = bars.len(), years = years.len(), "cached bars");
        Ok(())
    }

    /// Every `{year}.parquet` under the symbol's partition.
    fn year_files(&self, symbol: &str) -> Result<Vec<PathBuf>, DataError> {
        let dir = self.partition(symbol);
        let entries = fs::read_dir(&dir)
            .map_err(|e| DataError::CacheError(format!("{}: {e}", dir.display())))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| DataError::CacheError(format!("{}: {e}", dir.display())))?
                .path();
            if path.extension().is_some_and(|ext| ext == "parquet") {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Every cached bar for `symbol`, oldest first.
    ///
    /// Fails with `CacheError` when a year file had to be quarantined or the
    /// bars no longer hash to the sidecar's `data_hash`; the sidecar is
    /// removed first so coverage checks report the symbol as uncached.
    pub fn load(&self, symbol: &str) -> Result<Vec<Bar>, DataError> {
        let missing = || DataError::NoCachedDataOffline {
            symbol: symbol.to_string(),
        };
        if !self.partition(symbol).is_dir() {
            return Err(missing());
        }

        let mut bars = Vec::new();
        let mut quarantined = 0;
        for path in self.year_files(symbol)? {
            match read_year_file(&path) {
                Ok(chunk) => bars.extend(chunk),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "quarantining unreadable cache file");
                    let _ = fs::rename(&path, path.with_extension("parquet.quarantined"));
                    quarantined += 1;
                }
            }
        }
        // read_dir order is unspecified
        bars.sort_by_key(|b| b.date);

        let meta = self.get_meta(symbol);
        let damage = if quarantined > 0 {
            Some(format!("{quarantined} unreadable year file(s) quarantined"))
        } else {
            meta.filter(|m| m.data_hash != hash_bars(&bars))
                .map(|m| format!("{} bars on disk do not match the {} recorded", bars.len(), m.bar_count))
        };
        if let Some(damage) = damage {
            self.invalidate(symbol);
            return Err(DataError::CacheError(format!("cached bars for {symbol} are damaged: {damage}")));
        }

        if bars.is_empty() {
            return Err(missing());
        }
        Ok(bars)
    }

    /// Drop the sidecar so the symbol reads as uncached.
    fn invalidate(&self, symbol: &str) {
        let path = self.partition(symbol).join(META_FILE);
        match fs::remove_file(&path) {
            Ok(()) => tracing::warn!(symbol, "dropped cache metadata"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(symbol, error = %e, "failed to drop cache metadata"),
        }
    }

    /// Cached bars dated within `[start, end]`.
    pub fn load_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let mut bars = self.load(symbol)?;
        bars.retain(|b| (start..=end).contains(&b.date));
        Ok(bars)
    }

    pub fn get_meta(&self, symbol: &str) -> Option<CacheMeta> {
        let raw = fs::read_to_string(self.partition(symbol).join(META_FILE)).ok()?;
        serde_json::from_str(&raw).ok()
    }

    pub fn status(&self, symbols: &[&str]) -> Vec<CacheStatus> {
        symbols
            .iter()
            .map(|&symbol| CacheStatus::from_meta(symbol, self.get_meta(symbol)))
            .collect()
    }

    pub fn covers_range(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> CoverageResult {
        let Some(meta) = self.get_meta(symbol) else {
            return CoverageResult::NotCached;
        };
        if meta.start_date <= start && end <= meta.end_date {
            CoverageResult::FullyCovered
        } else {
            CoverageResult::PartiallyCovered {
                cached_start: meta.start_date,
                cached_end: meta.end_date,
            }
        }
    }
}

/// BLAKE3 digest of the bars, stable across runs and platforms.
pub fn hash_bars(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.date.num_days_from_ce().to_le_bytes());
        for price in [bar.open, bar.high, bar.low, bar.close] {
            hasher.update(&price.to_bits().to_le_bytes());
        }
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Union of two bar sets by date; `fresh` wins on conflicts.
fn merge_bars(existing: Vec<Bar>, fresh: &[Bar]) -> Vec<Bar> {
    let mut by_date: BTreeMap<NaiveDate, Bar> =
        existing.into_iter().map(|b| (b.date, b)).collect();
    for bar in fresh {
        by_date.insert(bar.date, bar.clone());
    }
    by_date.into_values().collect()
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

fn prev_day(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}

fn year_of(path: &Path) -> Option<i32> {
    path.file_stem()?.to_str()?.parse().ok()
}

fn unix_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn to_frame(bars: &[&Bar]) -> Result<DataFrame, DataError> {
    let epoch = unix_epoch();
    let n = bars.len();
    let (mut days, mut open, mut high, mut low, mut close, mut volume) = (
        Vec::with_capacity(n),
        Vec::with_capacity(n),
        Vec::with_capacity(n),
        Vec::with_capacity(n),
        Vec::with_capacity(n),
        Vec::with_capacity(n),
    );
    for bar in bars {
        days.push((bar.date - epoch).num_days() as i32);
        open.push(bar.open);
        high.push(bar.high);
        low.push(bar.low);
        close.push(bar.close);
        volume.push(bar.volume);
    }

    let date = Column::new("date".into(), days)
        .cast(&DataType::Date)
        .map_err(|e| DataError::ParquetError(format!("date column: {e}")))?;
    DataFrame::new(vec![
        date,
        Column::new("open".into(), open),
        Column::new("high".into(), high),
        Column::new("low".into(), low),
        Column::new("close".into(), close),
        Column::new("volume".into(), volume),
    ])
    .map_err(|e| DataError::ParquetError(format!("build frame: {e}")))
}

/// Write `df` next to `target` and rename it into place.
fn write_atomically(target: &Path, df: &mut DataFrame) -> Result<(), DataError> {
    let tmp = target.with_extension("parquet.tmp");
    let written = fs::File::create(&tmp)
        .map_err(|e| e.to_string())
        .and_then(|file| ParquetWriter::new(file).finish(df).map_err(|e| e.to_string()))
        .and_then(|_| fs::rename(&tmp, target).map_err(|e| e.to_string()));
    written.map_err(|e| {
        let _ = fs::remove_file(&tmp);
        DataError::ParquetError(format!("{}: {e}", target.display()))
    })
}

fn read_year_file(path: &Path) -> Result<Vec<Bar>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(e.to_string()))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(e.to_string()))?;

    if df.height() == 0 {
        return Err(DataError::CacheError("zero rows".into()));
    }
    if let Some(missing) = COLUMNS.iter().find(|name| df.column(name).is_err()) {
        return Err(DataError::CacheError(format!("no '{missing}' column")));
    }
    from_frame(&df)
}

fn from_frame(df: &DataFrame) -> Result<Vec<Bar>, DataError> {
    let bad = |name: &str, e: PolarsError| DataError::ParquetError(format!("{name}: {e}"));
    let price = |name: &str| df.column(name).and_then(|c| c.f64()).map_err(|e| bad(name, e));

    let date = df.column("date").and_then(|c| c.date()).map_err(|e| bad("date", e))?;
    let (open, high, low, close) = (price("open")?, price("high")?, price("low")?, price("close")?);
    let volume = df.column("volume").and_then(|c| c.u64()).map_err(|e| bad("volume", e))?;

    let epoch = unix_epoch();
    (0..df.height())
        .map(|row| {
            let null = |name: &str| DataError::ParquetError(format!("null {name} in row {row}"));
            Ok(Bar {
                date: epoch + chrono::Duration::days(i64::from(date.get(row).ok_or_else(|| null("date"))?)),
                open: open.get(row).ok_or_else(|| null("open"))?,
                high: high.get(row).ok_or_else(|| null("high"))?,
                low: low.get(row).ok_or_else(|| null("low"))?,
                close: close.get(row).ok_or_else(|| null("close"))?,
                volume: volume.get(row).unwrap_or(0),
            })
        })
        .collect()
}
