//! Yahoo Finance chart API source.
//!
//! Fetches daily OHLCV bars from the v8 chart endpoint with retry and
//! exponential backoff. HTTP 403 trips the shared [`CircuitBreaker`]; repeated
//! 429/5xx responses open it through the failure threshold.

use super::circuit_breaker::CircuitBreaker;
use super::{take_trailing, BarSource, FetchError};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use screenlab_core::Bar;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

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
    volume: Vec<Option<f64>>,
}

/// Yahoo Finance daily bar source.
pub struct YahooSource {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooSource {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| FetchError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            base_url: "https://query2.finance.yahoo.com/v8/finance/chart".into(),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Point the source at another chart endpoint (mirrors, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Calendar window wide enough to hold `count` trading days.
    fn window(count: usize, now: DateTime<Utc>) -> (i64, i64) {
        let days = (count as i64 * 7 / 5) + 10;
        let start = now - ChronoDuration::days(days);
        (start.timestamp(), now.timestamp())
    }

    fn chart_url(&self, symbol: &str, count: usize) -> String {
        let (period1, period2) = Self::window(count, Utc::now());
        format!(
            "{}/{}?period1={period1}&period2={period2}&interval=1d",
            self.base_url,
            yahoo_symbol(symbol)
        )
    }

    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<Bar>, FetchError> {
        let result = match resp.chart.result {
            Some(result) => result,
            None => {
                return Err(match resp.chart.error {
                    Some(err) if err.code == "Not Found" => FetchError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    },
                    Some(err) => FetchError::ResponseFormatChanged(format!(
                        "{}: {}",
                        err.code, err.description
                    )),
                    None => FetchError::ResponseFormatChanged("empty result with no error".into()),
                })
            }
        };

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::ResponseFormatChanged("result array is empty".into()))?;
        let timestamps = data
            .timestamp
            .ok_or_else(|| FetchError::ResponseFormatChanged("no timestamps".into()))?;
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::ResponseFormatChanged("no quote data".into()))?;

        let field = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten();

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = DateTime::from_timestamp(ts, 0).ok_or_else(|| {
                FetchError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
            })?;

            // Holidays and halted sessions come back with null prices.
            let (Some(open), Some(high), Some(low), Some(close)) = (
                field(&quote.open, i),
                field(&quote.high, i),
                field(&quote.low, i),
                field(&quote.close, i),
            ) else {
                continue;
            };

            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume: field(&quote.volume, i).unwrap_or(0.0),
            });
        }

        Ok(bars)
    }

    fn fetch_with_retry(&self, symbol: &str, count: usize) -> Result<Vec<Bar>, FetchError> {
        let url = self.chart_url(symbol, count);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(symbol, attempt, ?delay, "retrying chart request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(FetchError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(FetchError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(FetchError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(FetchError::CircuitBreakerTripped);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(FetchError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(FetchError::AuthenticationRequired(
                    "Yahoo Finance requires authentication".into(),
                ));
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(FetchError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }
            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(FetchError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                FetchError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
            })?;
            let bars = Self::parse_response(symbol, chart)?;
            self.circuit_breaker.record_success();
            return Ok(bars);
        }

        Err(last_error.unwrap_or_else(|| FetchError::Other("max retries exceeded".into())))
    }
}

impl BarSource for YahooSource {
    fn name(&self) -> &str {
        "yahoo"
    }

    fn fetch_daily_bars(&self, symbol: &str, count: usize) -> Result<Vec<Bar>, FetchError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(FetchError::CircuitBreakerTripped);
        }
        let bars = self.fetch_with_retry(symbol, count)?;
        Ok(take_trailing(bars, count))
    }
}

/// Yahoo spells share classes with a dash (`BRK-B`), not a dot.
fn yahoo_symbol(symbol: &str) -> String {
    symbol.replace('.', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<Bar>, FetchError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooSource::parse_response("TEST", resp)
    }

    #[test]
    fn parses_quotes_and_skips_null_rows() {
        let bars = parse(
            r#"{"chart":{"result":[{"timestamp":[1704204000,1704290400,1704376800],
            "indicators":{"quote":[{"open":[10.0,null,12.0],"high":[11.0,null,13.0],
            "low":[9.0,null,11.0],"close":[10.5,null,12.5],"volume":[100,null,null]}]}}],
            "error":null}}"#,
        )
        .unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 10.5);
        assert_eq!(bars[0].volume, 100.0);
        assert_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn not_found_maps_to_symbol_not_found() {
        let err = parse(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::SymbolNotFound { .. }));
    }

    #[test]
    fn other_chart_error_is_format_change() {
        let err = parse(
            r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"oops"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::ResponseFormatChanged(_)));
    }

    #[test]
    fn window_covers_requested_trading_days() {
        let now = Utc::now();
        let (start, end) = YahooSource::window(120, now);
        let days = (end - start) / 86_400;
        assert!(days >= 168);
    }

    #[test]
    fn share_class_dot_becomes_dash() {
        assert_eq!(yahoo_symbol("BRK.B"), "BRK-B");
        assert_eq!(yahoo_symbol("AAPL"), "AAPL");
        let source = YahooSource::new(Arc::new(CircuitBreaker::default_provider()))
            .unwrap()
            .with_base_url("http://localhost/chart");
        assert!(source
            .chart_url("BRK.B", 10)
            .starts_with("http://localhost/chart/BRK-B?period1="));
    }

    #[test]
    fn open_breaker_refuses_without_network() {
        let breaker = Arc::new(CircuitBreaker::new(Duration::from_secs(60)));
        breaker.trip();
        let source = YahooSource::new(breaker).unwrap();
        let err = source.fetch_daily_bars("AAPL", 10).unwrap_err();
        assert!(matches!(err, FetchError::CircuitBreakerTripped));
    }
}
