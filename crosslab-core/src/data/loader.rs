//! Read-through cache loader and loader-stack construction.
//!
//! Resolution order for a fetch:
//! 1. Cache covers the range (and not forcing) → cached bars
//! 2. Upstream configured and online → fetch, merge into the cache, return
//! 3. Offline with a partial cache → whatever the cache holds for the range
//! 4. Otherwise → `NoCachedDataOffline`
//!
//! A damaged cache entry drops its own coverage (see [`ParquetCache::load`]),
//! so step 1 falls through to step 2 when online. A request disjoint from the
//! cached range is widened upstream to bridge the gap, keeping older history.

use chrono::NaiveDate;
use std::sync::Arc;

use super::cache::{CoverageResult, ParquetCache};
use super::circuit_breaker::CircuitBreaker;
use super::csv_import::CsvLoader;
use super::provider::{DataError, DataSource, FetchResult, SeriesLoader};
use super::synthetic::SyntheticLoader;
use super::yahoo::YahooLoader;
use crate::config::{DataConfig, DataSourceKind};

/// Options controlling how the cache is consulted.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// If true, never make network requests.
    pub offline: bool,
    /// Re-fetch even when the cache covers the range.
    pub force: bool,
}

/// Wraps an upstream loader with the Parquet cache.
pub struct CachedLoader {
    cache: ParquetCache,
    upstream: Option<Box<dyn SeriesLoader>>,
    options: LoadOptions,
}

impl CachedLoader {
    pub fn new(
        cache: ParquetCache,
        upstream: Option<Box<dyn SeriesLoader>>,
        options: LoadOptions,
    ) -> Self {
        Self {
            cache,
            upstream,
            options,
        }
    }

    pub fn cache(&self) -> &ParquetCache {
        &self.cache
    }

    fn cached(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
        let bars = self.cache.load_range(symbol, start, end)?;
        tracing::info!(symbol, bars = bars.len(), "serving bars from cache");
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Cache,
        })
    }

    fn online(&self) -> bool {
        self.upstream.is_some() && !self.options.offline
    }
}

impl SeriesLoader for CachedLoader {
    fn name(&self) -> &str {
        "cache"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let coverage = self.cache.covers_range(symbol, start, end);

        if !self.options.force && coverage == CoverageResult::FullyCovered {
            match self.cached(symbol, start, end) {
                Ok(hit) => return Ok(hit),
                Err(e) if self.online() => {
                    tracing::warn!(symbol, error = %e, "cache unusable, refetching");
                }
                Err(e) => return Err(e),
            }
        }

        match &self.upstream {
            Some(upstream) if !self.options.offline => {
                let (fetch_start, fetch_end) = self.cache.bridged_range(symbol, start, end);
                let mut fetched = upstream.fetch(symbol, fetch_start, fetch_end)?;
                if let Err(e) = self.cache.merge_write(
                    symbol,
                    &fetched.bars,
                    fetched.source,
                    fetch_start,
                    fetch_end,
                ) {
                    tracing::warn!(symbol, error = %e, "failed to cache fetched bars");
                }
                fetched.bars.retain(|b| (start..=end).contains(&b.date));
                Ok(fetched)
            }
            _ => match coverage {
                CoverageResult::PartiallyCovered {
                    cached_start,
                    cached_end,
                } => {
                    tracing::warn!(
                        symbol,
                        %cached_start,
                        %cached_end,
                        "offline: cache only partly covers the requested range"
                    );
                    self.cached(symbol, start, end)
                }
                CoverageResult::FullyCovered => self.cached(symbol, start, end),
                CoverageResult::NotCached => Err(DataError::NoCachedDataOffline {
                    symbol: symbol.to_string(),
                }),
            },
        }
    }

    fn is_available(&self) -> bool {
        match &self.upstream {
            Some(upstream) if !self.options.offline => upstream.is_available(),
            _ => true,
        }
    }
}

/// Build the loader stack described by `config`.
///
/// Yahoo goes behind the Parquet cache; CSV and synthetic sources are read
/// directly.
pub fn open_loader(config: &DataConfig) -> Result<Box<dyn SeriesLoader>, DataError> {
    match config.source {
        DataSourceKind::Yahoo => {
            let upstream: Option<Box<dyn SeriesLoader>> = if config.offline {
                None
            } else {
                let breaker = Arc::new(CircuitBreaker::default_provider());
                Some(Box::new(YahooLoader::new(breaker)?))
            };
            Ok(Box::new(CachedLoader::new(
                ParquetCache::new(&config.cache_dir),
                upstream,
                LoadOptions {
                    offline: config.offline,
                    force: false,
                },
            )))
        }
        DataSourceKind::Csv => {
            let path = config
                .csv_path
                .as_ref()
                .ok_or_else(|| DataError::CsvError("no csv_path configured".into()))?;
            Ok(Box::new(CsvLoader::new(path)))
        }
        DataSourceKind::Synthetic => Ok(Box::new(SyntheticLoader::new())),
    }
}
