//! Ordered fallback across several sources.

use super::{BarSource, FetchError};
use screenlab_core::Bar;

/// Tries each source in order and returns the first non-empty result.
///
/// When every source fails or comes back empty, the last error is returned
/// (or an empty vector if the last source answered without error).
pub struct FallbackSource {
    sources: Vec<Box<dyn BarSource>>,
}

impl FallbackSource {
    pub fn new(sources: Vec<Box<dyn BarSource>>) -> Self {
        Self { sources }
    }
}

impl BarSource for FallbackSource {
    fn name(&self) -> &str {
        "fallback"
    }

    fn fetch_daily_bars(&self, symbol: &str, count: usize) -> Result<Vec<Bar>, FetchError> {
        let mut last = Ok(Vec::new());
        for source in &self.sources {
            match source.fetch_daily_bars(symbol, count) {
                Ok(bars) if !bars.is_empty() => return Ok(bars),
                Ok(bars) => {
                    tracing::debug!(symbol, source = source.name(), "source returned no bars");
                    last = Ok(bars);
                }
                Err(e) => {
                    tracing::debug!(symbol, source = source.name(), error = %e, "source failed");
                    last = Err(e);
                }
            }
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SyntheticSource;

    struct Failing;

    impl BarSource for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn fetch_daily_bars(&self, symbol: &str, _count: usize) -> Result<Vec<Bar>, FetchError> {
            Err(FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
        }
    }

    struct Empty;

    impl BarSource for Empty {
        fn name(&self) -> &str {
            "empty"
        }

        fn fetch_daily_bars(&self, _symbol: &str, _count: usize) -> Result<Vec<Bar>, FetchError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn falls_through_to_first_non_empty() {
        let source = FallbackSource::new(vec![
            Box::new(Failing),
            Box::new(Empty),
            Box::new(SyntheticSource::new()),
        ]);
        let bars = source.fetch_daily_bars("SPY", 10).unwrap();
        assert_eq!(bars.len(), 10);
    }

    #[test]
    fn all_failing_returns_last_error() {
        let source = FallbackSource::new(vec![Box::new(Empty), Box::new(Failing)]);
        assert!(source.fetch_daily_bars("SPY", 10).is_err());
    }

    #[test]
    fn empty_last_returns_empty() {
        let source = FallbackSource::new(vec![Box::new(Failing), Box::new(Empty)]);
        assert!(source.fetch_daily_bars("SPY", 10).unwrap().is_empty());
    }
}
