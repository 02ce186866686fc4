//! Bar sources: where the screener gets its daily bars from.
//!
//! The [`BarSource`] trait abstracts over data feeds (CSV files on disk, the
//! Yahoo chart API, deterministic synthetic data) so the screener can swap
//! implementations and tests can inject mocks. Which implementation is used
//! is chosen explicitly through [`SourceKind`].

mod circuit_breaker;
mod csv_file;
mod fallback;
mod synthetic;
mod yahoo;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use csv_file::{read_bars_csv, CsvSource};
pub use fallback::FallbackSource;
pub use synthetic::SyntheticSource;
pub use yahoo::YahooSource;

use screenlab_core::Bar;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while fetching bars for one symbol.
///
/// The screener logs these and skips the symbol; they never abort a run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("provider has blocked requests (circuit breaker open)")]
    CircuitBreakerTripped,

    #[error("no bar file for '{symbol}' at {path}")]
    MissingFile { symbol: String, path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("fetch error: {0}")]
    Other(String),
}

/// Supplier of daily OHLCV bars.
pub trait BarSource: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Fetch up to `count` trailing daily bars for `symbol`, ascending by time.
    ///
    /// An `Ok` with an empty vector means the symbol has no data.
    fn fetch_daily_bars(&self, symbol: &str, count: usize) -> Result<Vec<Bar>, FetchError>;
}

impl<S: BarSource + ?Sized> BarSource for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_daily_bars(&self, symbol: &str, count: usize) -> Result<Vec<Bar>, FetchError> {
        (**self).fetch_daily_bars(symbol, count)
    }
}

impl<S: BarSource + ?Sized> BarSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_daily_bars(&self, symbol: &str, count: usize) -> Result<Vec<Bar>, FetchError> {
        (**self).fetch_daily_bars(symbol, count)
    }
}

/// Which bar source to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Csv,
    Yahoo,
    #[default]
    Synthetic,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Yahoo => "yahoo",
            Self::Synthetic => "synthetic",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown source kind '{0}'")]
pub struct SourceKindParseError(pub String);

impl std::str::FromStr for SourceKind {
    type Err = SourceKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "yahoo" => Ok(Self::Yahoo),
            "synthetic" => Ok(Self::Synthetic),
            other => Err(SourceKindParseError(other.to_string())),
        }
    }
}

/// Construct the source selected by `kind`.
///
/// `csv_dir` is only consulted for [`SourceKind::Csv`]. The Yahoo source is
/// wrapped in a [`FallbackSource`] that falls back to CSV files when a
/// directory is configured.
pub fn build_source(
    kind: SourceKind,
    csv_dir: Option<PathBuf>,
) -> Result<Box<dyn BarSource>, FetchError> {
    match kind {
        SourceKind::Csv => {
            let dir = csv_dir.ok_or_else(|| {
                FetchError::Other("csv source requires a directory (source.csv_dir)".into())
            })?;
            Ok(Box::new(CsvSource::new(dir)))
        }
        SourceKind::Yahoo => {
            let yahoo = YahooSource::new(Arc::new(CircuitBreaker::default_provider()))?;
            match csv_dir {
                Some(dir) => Ok(Box::new(FallbackSource::new(vec![
                    Box::new(yahoo),
                    Box::new(CsvSource::new(dir)),
                ]))),
                None => Ok(Box::new(yahoo)),
            }
        }
        SourceKind::Synthetic => Ok(Box::new(SyntheticSource::new())),
    }
}

/// Keep only the trailing `count` bars.
pub(crate) fn take_trailing(mut bars: Vec<Bar>, count: usize) -> Vec<Bar> {
    if bars.len() > count {
        let excess = bars.len() - count;
        bars.drain(..excess);
    }
    bars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_parses_case_insensitively() {
        assert_eq!("CSV".parse::<SourceKind>().unwrap(), SourceKind::Csv);
        assert_eq!(" yahoo ".parse::<SourceKind>().unwrap(), SourceKind::Yahoo);
        assert_eq!("synthetic".parse::<SourceKind>().unwrap(), SourceKind::Synthetic);
        assert_eq!(
            "parquet".parse::<SourceKind>(),
            Err(SourceKindParseError("parquet".into()))
        );
    }

    #[test]
    fn source_kind_serde_is_lowercase() {
        let json = serde_json::to_string(&SourceKind::Yahoo).unwrap();
        assert_eq!(json, "\"yahoo\"");
    }

    #[test]
    fn csv_kind_without_dir_is_an_error() {
        assert!(build_source(SourceKind::Csv, None).is_err());
    }

    #[test]
    fn synthetic_kind_builds() {
        let source = build_source(SourceKind::Synthetic, None).unwrap();
        assert_eq!(source.name(), "synthetic");
    }
}
