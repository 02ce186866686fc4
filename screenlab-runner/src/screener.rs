//! Multi-symbol screener.
//!
//! Resolves symbols through the [`Universe`], fetches daily bars per symbol,
//! evaluates the requested filters, applies agreement and confidence
//! thresholds (optionally confirmed on weekly bars) and ranks the survivors.
//!
//! Per-symbol work fans out on rayon. A symbol whose fetch fails or comes
//! back empty is logged and skipped; it never aborts the run.

use crate::cache::{cache_key, ResultCache};
use crate::scoring::{confidence, Agreement, ConfidenceMode};
use crate::source::BarSource;
use crate::universe::Universe;
use rayon::prelude::*;
use screenlab_core::resample::DAYS_PER_WEEK;
use screenlab_core::{evaluate_filters, to_weekly, Direction, FilterId, TradeSignal, MIN_BARS};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Trailing daily bars fetched per symbol by default.
pub const DEFAULT_DAILY_BARS: usize = 120;

/// Fewest daily bars that resample to enough weekly bars for evaluation.
pub const MIN_WEEKLY_DAILY_BARS: usize = MIN_BARS * DAYS_PER_WEEK;

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("failed to build screener thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid screen options: {0}")]
    InvalidOptions(String),
}

/// Thresholds applied to each symbol's evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenOptions {
    pub require_two_plus: bool,
    pub min_confidence: f64,
    pub require_weekly_agree: bool,
    pub confidence_mode: ConfidenceMode,
    pub daily_bars: usize,
}

impl Default for ScreenOptions {
    fn default() -> Self {
        Self {
            require_two_plus: false,
            min_confidence: 0.0,
            require_weekly_agree: false,
            confidence_mode: ConfidenceMode::Simple,
            daily_bars: DEFAULT_DAILY_BARS,
        }
    }
}

impl ScreenOptions {
    /// `min_confidence` must lie in `[0, 1]` (NaN never does) and at least
    /// one daily bar must be requested.
    pub fn validate(&self) -> Result<(), ScreenError> {
        let min = self.min_confidence;
        if !(0.0..=1.0).contains(&min) {
            return Err(ScreenError::InvalidOptions(format!(
                "min_confidence must be within [0, 1], got {min}"
            )));
        }
        if self.daily_bars == 0 {
            return Err(ScreenError::InvalidOptions(
                "daily_bars must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// One ranked screener result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenRow {
    pub symbol: String,
    pub price: f64,
    pub signals: Vec<TradeSignal>,
    pub confidence: f64,
    pub direction: Option<Direction>,
}

/// Cooperative cancellation flag shared with the caller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Screener over one bar source.
pub struct Screener<S> {
    source: S,
    universe: Universe,
    cache: Option<Arc<dyn ResultCache>>,
    pool: Option<rayon::ThreadPool>,
}

impl<S: BarSource> Screener<S> {
    /// Screener with the built-in universe, no cache and the global pool.
    pub fn new(source: S) -> Self {
        Self {
            source,
            universe: Universe::default_us(),
            cache: None,
            pool: None,
        }
    }

    pub fn with_universe(mut self, universe: Universe) -> Self {
        self.universe = universe;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Run on a private pool of `threads` workers instead of the global one.
    pub fn with_threads(mut self, threads: usize) -> Result<Self, ScreenError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("screenlab-worker-{i}"))
            .build()?;
        self.pool = Some(pool);
        Ok(self)
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Screen `symbols` (tickers or basket codes) against `filters`.
    pub fn run<T: AsRef<str>>(
        &self,
        symbols: &[T],
        filters: &[FilterId],
        options: &ScreenOptions,
    ) -> Vec<ScreenRow> {
        self.run_with_cancel(symbols, filters, options, &CancelToken::new())
    }

    /// Like [`Screener::run`], but stops starting new symbols once `cancel`
    /// fires. Rows already finished are still returned, ranked. A cancelled
    /// run is never cached. Options that fail [`ScreenOptions::validate`]
    /// produce no rows.
    pub fn run_with_cancel<T: AsRef<str>>(
        &self,
        symbols: &[T],
        filters: &[FilterId],
        options: &ScreenOptions,
        cancel: &CancelToken,
    ) -> Vec<ScreenRow> {
        let started = Instant::now();
        if let Err(e) = options.validate() {
            tracing::warn!(error = %e, "screen options rejected");
            return Vec::new();
        }
        let resolved = self.universe.resolve(symbols);
        if resolved.is_empty() || filters.is_empty() {
            return Vec::new();
        }
        if options.require_weekly_agree && options.daily_bars < MIN_WEEKLY_DAILY_BARS {
            tracing::warn!(
                daily_bars = options.daily_bars,
                needed = MIN_WEEKLY_DAILY_BARS,
                "too few daily bars for weekly confirmation, every symbol will be rejected"
            );
        }

        let key = self
            .cache
            .as_ref()
            .map(|_| cache_key(&resolved, filters, options));
        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(rows) = cache.get(key) {
                tracing::debug!(rows = rows.len(), "screener cache hit");
                return rows;
            }
        }

        let evaluate = || -> Vec<Option<ScreenRow>> {
            resolved
                .par_iter()
                .map(|symbol| {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    self.screen_symbol(symbol, filters, options)
                })
                .collect()
        };
        let outcomes = match &self.pool {
            Some(pool) => pool.install(evaluate),
            None => evaluate(),
        };

        let mut rows: Vec<ScreenRow> = outcomes.into_iter().flatten().collect();
        rank(&mut rows);

        let cancelled = cancel.is_cancelled();
        tracing::info!(
            symbols = resolved.len(),
            matched = rows.len(),
            cancelled,
            source = self.source.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "screener run complete"
        );

        if !cancelled {
            if let (Some(cache), Some(key)) = (&self.cache, &key) {
                cache.set(key, rows.clone());
            }
        }
        rows
    }

    /// Evaluate one symbol. `None` when it is skipped or filtered out.
    pub fn screen_symbol(
        &self,
        symbol: &str,
        filters: &[FilterId],
        options: &ScreenOptions,
    ) -> Option<ScreenRow> {
        let bars = match self.source.fetch_daily_bars(symbol, options.daily_bars) {
            Ok(bars) if bars.is_empty() => {
                tracing::debug!(symbol, "no bars returned, skipping");
                return None;
            }
            Ok(bars) => bars,
            Err(e) => {
                tracing::warn!(symbol, error = %e, "bar fetch failed, skipping");
                return None;
            }
        };

        let evaluation = evaluate_filters(&bars, filters);
        if evaluation.matched.is_empty() {
            tracing::debug!(symbol, bars = bars.len(), "no filters matched");
            return None;
        }

        let agreement = Agreement::from_signals(&evaluation.matched);
        if options.require_two_plus && !agreement.two_plus() {
            tracing::debug!(symbol, "rejected: no two-plus agreement");
            return None;
        }

        let score = confidence(&evaluation.matched, options.confidence_mode);
        if score < options.min_confidence {
            tracing::debug!(symbol, confidence = score, "rejected: below min confidence");
            return None;
        }

        if options.require_weekly_agree {
            let weekly = evaluate_filters(&to_weekly(&bars), filters);
            if !Agreement::from_signals(&weekly.matched).two_plus() {
                tracing::debug!(symbol, "rejected: weekly bars do not agree");
                return None;
            }
        }

        tracing::debug!(symbol, confidence = score, signals = evaluation.matched.len(), "matched");
        Some(ScreenRow {
            symbol: symbol.to_string(),
            price: evaluation.price,
            direction: agreement.dominant(),
            signals: evaluation.matched,
            confidence: score,
        })
    }
}

/// Stable sort by confidence, highest first.
pub fn rank(rows: &mut [ScreenRow]) {
    rows.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
}
