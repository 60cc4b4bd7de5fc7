//! Yahoo Finance series loader.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API with retry, exponential
//! backoff and a shared circuit breaker. Yahoo has no official API and its
//! format can change without notice; the CSV loader is the fallback.

use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataSource, FetchResult, SeriesLoader};
use crate::domain::Bar;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

fn value_at(column: &[Option<f64>], i: usize) -> Option<f64> {
    column.get(i).copied().flatten()
}

pub struct YahooLoader {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooLoader {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::default()).and_utc().timestamp();
        let end_ts = end.and_time(chrono::NaiveTime::default()).and_utc().timestamp() + 86_399;
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    /// Turn a chart response into bars.
    ///
    /// Rows with any missing OHLC value (holidays, partial sessions) are
    /// dropped; a missing volume counts as zero.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<Bar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // No timestamps means no trading days in the window.
        let timestamps = data.timestamp.unwrap_or_default();

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());
        let mut skipped = 0usize;

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            match (
                value_at(&quote.open, i),
                value_at(&quote.high, i),
                value_at(&quote.low, i),
                value_at(&quote.close, i),
            ) {
                (Some(open), Some(high), Some(low), Some(close)) => bars.push(Bar {
                    date,
                    open,
                    high,
                    low,
                    close,
                    volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
                }),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::debug!(symbol, skipped, "dropped incomplete rows from Yahoo response");
        }

        Ok(bars)
    }

    fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let url = Self::chart_url(symbol, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(symbol, attempt, ?delay, "retrying Yahoo request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();

            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after_secs = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited { retry_after_secs });
                continue;
            }

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(DataError::AuthenticationRequired(
                    "Yahoo Finance requires authentication".into(),
                ));
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }

            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "failed to parse response for {symbol}: {e}"
                ))
            })?;

            let bars = Self::parse_response(symbol, chart)?;
            self.circuit_breaker.record_success();
            return Ok(bars);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl SeriesLoader for YahooLoader {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        tracing::info!(symbol, %start, %end, "fetching from Yahoo Finance");
        let bars = self.fetch_with_retry(symbol, start, end)?;
        if bars.is_empty() {
            return Err(DataError::EmptyRange {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<Bar>, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooLoader::parse_response("TEST", resp)
    }

    #[test]
    fn parses_quotes_and_skips_incomplete_rows() {
        // 2024-01-02, 2024-01-03, 2024-01-04 at 14:30 UTC
        let bars = parse(
            r#"{"chart":{"result":[{"timestamp":[1704205800,1704292200,1704378600],
                "indicators":{"quote":[{
                    "open":[100.0,null,102.0],
                    "high":[101.0,102.5,103.0],
                    "low":[99.0,100.5,101.0],
                    "close":[100.5,101.5,102.5],
                    "volume":[1000,1100,null]}]}}],"error":null}}"#,
        )
        .unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[0].close, 100.5);
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(bars[1].volume, 0);
    }

    #[test]
    fn not_found_maps_to_symbol_not_found() {
        let err = parse(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { ref symbol } if symbol == "TEST"));
    }

    #[test]
    fn other_errors_are_format_changes() {
        let err = parse(r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"x"}}}"#)
            .unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }

    #[test]
    fn missing_timestamps_yield_no_bars() {
        let bars = parse(
            r#"{"chart":{"result":[{"indicators":{"quote":[{
                "open":[],"high":[],"low":[],"close":[],"volume":[]}]}}],"error":null}}"#,
        )
        .unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn url_covers_whole_end_day() {
        let url = YahooLoader::chart_url(
            "WIPRO.NS",
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        );
        assert!(url.contains("/chart/WIPRO.NS?"));
        assert!(url.contains("period1=1672531200"));
        assert!(url.contains("period2=1672617599"));
        assert!(url.contains("interval=1d"));
    }
}
