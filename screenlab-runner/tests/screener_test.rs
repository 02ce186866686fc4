//! Screener orchestration scenarios over an in-memory bar source.

use chrono::{TimeZone, Utc};
use screenlab_core::{Bar, Direction, FilterId, IndicatorKind};
use screenlab_runner::{
    BarSource, CancelToken, ConfidenceMode, FetchError, ScreenOptions, Screener, TtlCache,
    Universe,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ──────────────────────────────────────────────
// Fixtures
// ──────────────────────────────────────────────

fn bar(i: usize, close: f64, volume: f64) -> Bar {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    Bar {
        timestamp: base + chrono::Duration::days(i as i64),
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume,
    }
}

/// `n - 1` quiet bars oscillating between 100 and 101, then a high-volume
/// close at 110.
fn breakout(n: usize) -> Vec<Bar> {
    let mut bars: Vec<Bar> = (0..n - 1)
        .map(|i| bar(i, if i % 2 == 0 { 100.0 } else { 101.0 }, 1000.0))
        .collect();
    bars.push(bar(n - 1, 110.0, 5000.0));
    bars
}

/// Forty bars sliding one point a day from 200: RSI pinned at 0.
fn selloff() -> Vec<Bar> {
    (0..40).map(|i| bar(i, 200.0 - i as f64, 1000.0)).collect()
}

fn flat() -> Vec<Bar> {
    (0..40).map(|i| bar(i, 100.0, 1000.0)).collect()
}

/// Serves fixture bars by symbol. `FAIL` errors, unknown symbols are empty.
struct FixtureSource {
    bars: HashMap<String, Vec<Bar>>,
    calls: AtomicUsize,
    cancel_on_fetch: Option<CancelToken>,
}

impl FixtureSource {
    fn new() -> Self {
        let mut bars = HashMap::new();
        bars.insert("UP".to_string(), breakout(40));
        bars.insert("DOWN".to_string(), selloff());
        bars.insert("FLAT".to_string(), flat());
        bars.insert("LONGUP".to_string(), breakout(200));
        Self {
            bars,
            calls: AtomicUsize::new(0),
            cancel_on_fetch: None,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BarSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    fn fetch_daily_bars(&self, symbol: &str, count: usize) -> Result<Vec<Bar>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.cancel_on_fetch {
            token.cancel();
        }
        if symbol == "FAIL" {
            return Err(FetchError::NetworkUnreachable("connection refused".into()));
        }
        let bars = self.bars.get(symbol).cloned().unwrap_or_default();
        let start = bars.len().saturating_sub(count);
        Ok(bars[start..].to_vec())
    }
}

const BREAKOUT_FILTERS: [FilterId; 3] =
    [FilterId::RsiOversold, FilterId::BbBreakoutUp, FilterId::AtrSpike];

fn symbols(row_symbols: &[screenlab_runner::ScreenRow]) -> Vec<&str> {
    row_symbols.iter().map(|r| r.symbol.as_str()).collect()
}

// ──────────────────────────────────────────────
// Inclusion and ranking
// ──────────────────────────────────────────────

#[test]
fn rows_are_ranked_by_confidence() {
    let screener = Screener::new(FixtureSource::new());
    let rows = screener.run(&["DOWN", "FLAT", "UP"], &BREAKOUT_FILTERS, &ScreenOptions::default());

    assert_eq!(symbols(&rows), vec!["UP", "DOWN"]);
    assert!((rows[0].confidence - 2.8 / 3.0).abs() < 1e-9);
    assert!((rows[1].confidence - 0.8).abs() < 1e-9);
    assert_eq!(rows[0].price, 110.0);
    assert_eq!(rows[0].direction, Some(Direction::Buy));
    assert_eq!(rows[1].direction, Some(Direction::Buy));
}

#[test]
fn two_plus_excludes_a_single_rsi_signal() {
    let screener = Screener::new(FixtureSource::new());
    let loose = screener.run(&["DOWN"], &[FilterId::RsiOversold], &ScreenOptions::default());
    assert_eq!(loose.len(), 1);
    assert_eq!(loose[0].signals.len(), 1);
    assert_eq!(loose[0].signals[0].indicator, IndicatorKind::Rsi);

    let strict = ScreenOptions {
        require_two_plus: true,
        ..ScreenOptions::default()
    };
    assert!(screener.run(&["DOWN"], &[FilterId::RsiOversold], &strict).is_empty());
}

#[test]
fn two_plus_keeps_bollinger_and_atr_agreement() {
    let screener = Screener::new(FixtureSource::new());
    let strict = ScreenOptions {
        require_two_plus: true,
        ..ScreenOptions::default()
    };
    let rows = screener.run(&["UP", "DOWN"], &BREAKOUT_FILTERS, &strict);
    assert_eq!(symbols(&rows), vec!["UP"]);
}

#[test]
fn min_confidence_is_inclusive_threshold() {
    let screener = Screener::new(FixtureSource::new());
    let at = ScreenOptions {
        min_confidence: 0.8,
        ..ScreenOptions::default()
    };
    assert_eq!(screener.run(&["DOWN"], &[FilterId::RsiOversold], &at).len(), 1);

    let above = ScreenOptions {
        min_confidence: 0.81,
        ..ScreenOptions::default()
    };
    assert!(screener.run(&["DOWN"], &[FilterId::RsiOversold], &above).is_empty());
}

#[test]
fn family_weighted_mode_matches_simple_when_unanimous() {
    let screener = Screener::new(FixtureSource::new());
    let weighted = ScreenOptions {
        confidence_mode: ConfidenceMode::FamilyWeighted,
        ..ScreenOptions::default()
    };
    let rows = screener.run(&["UP"], &BREAKOUT_FILTERS, &weighted);
    assert!((rows[0].confidence - 2.8 / 3.0).abs() < 1e-9);
}

#[test]
fn empty_filter_set_matches_nothing() {
    let screener = Screener::new(FixtureSource::new());
    assert!(screener.run(&["UP"], &[], &ScreenOptions::default()).is_empty());
}

#[test]
fn invalid_min_confidence_matches_nothing() {
    let screener = Screener::new(FixtureSource::new());
    let opts = ScreenOptions {
        min_confidence: f64::NAN,
        ..ScreenOptions::default()
    };
    assert!(screener.run(&["UP", "DOWN"], &BREAKOUT_FILTERS, &opts).is_empty());
    assert_eq!(screener.source().calls(), 0);
}

// ──────────────────────────────────────────────
// Weekly confirmation
// ──────────────────────────────────────────────

#[test]
fn weekly_agreement_confirms_long_breakout() {
    let screener = Screener::new(FixtureSource::new());
    let opts = ScreenOptions {
        require_weekly_agree: true,
        daily_bars: 200,
        ..ScreenOptions::default()
    };
    let rows = screener.run(&["LONGUP"], &[FilterId::BbBreakoutUp, FilterId::AtrSpike], &opts);
    assert_eq!(symbols(&rows), vec!["LONGUP"]);
}

#[test]
fn weekly_agreement_fails_on_short_history() {
    let screener = Screener::new(FixtureSource::new());
    let filters = [FilterId::BbBreakoutUp, FilterId::AtrSpike];
    let daily_only = ScreenOptions::default();
    assert_eq!(screener.run(&["UP"], &filters, &daily_only).len(), 1);

    // 40 daily bars resample to 8 weekly bars, below the evaluation minimum.
    let weekly = ScreenOptions {
        require_weekly_agree: true,
        ..ScreenOptions::default()
    };
    assert!(screener.run(&["UP"], &filters, &weekly).is_empty());
}

// ──────────────────────────────────────────────
// Resolution and failures
// ──────────────────────────────────────────────

#[test]
fn failed_and_empty_fetches_are_skipped() {
    let source = FixtureSource::new();
    let screener = Screener::new(source);
    let rows = screener.run(&["FAIL", "NODATA", "UP"], &BREAKOUT_FILTERS, &ScreenOptions::default());
    assert_eq!(symbols(&rows), vec!["UP"]);
    assert_eq!(screener.source().calls(), 3);
}

#[test]
fn symbols_are_normalized_and_deduplicated() {
    let screener = Screener::new(FixtureSource::new());
    let rows = screener.run(&[" up", "UP", "Up "], &BREAKOUT_FILTERS, &ScreenOptions::default());
    assert_eq!(rows.len(), 1);
    assert_eq!(screener.source().calls(), 1);
}

#[test]
fn basket_codes_expand_to_members() {
    let mut baskets = BTreeMap::new();
    baskets.insert("movers".to_string(), vec!["up".to_string(), "down".to_string()]);
    let screener =
        Screener::new(FixtureSource::new()).with_universe(Universe::from_baskets(baskets));

    let rows = screener.run(&["MOVERS"], &BREAKOUT_FILTERS, &ScreenOptions::default());
    assert_eq!(symbols(&rows), vec!["UP", "DOWN"]);
}

#[test]
fn private_pool_gives_same_rows() {
    let shared = Screener::new(FixtureSource::new());
    let pooled = Screener::new(FixtureSource::new()).with_threads(2).unwrap();
    let input = ["FLAT", "DOWN", "UP", "FAIL"];
    assert_eq!(
        shared.run(&input, &BREAKOUT_FILTERS, &ScreenOptions::default()),
        pooled.run(&input, &BREAKOUT_FILTERS, &ScreenOptions::default())
    );
}

// ──────────────────────────────────────────────
// Cancellation
// ──────────────────────────────────────────────

#[test]
fn pre_cancelled_run_fetches_nothing() {
    let screener = Screener::new(FixtureSource::new());
    let token = CancelToken::new();
    token.cancel();
    let rows =
        screener.run_with_cancel(&["UP", "DOWN"], &BREAKOUT_FILTERS, &ScreenOptions::default(), &token);
    assert!(rows.is_empty());
    assert_eq!(screener.source().calls(), 0);
}

#[test]
fn cancel_mid_run_keeps_finished_rows() {
    let token = CancelToken::new();
    let mut source = FixtureSource::new();
    source.cancel_on_fetch = Some(token.clone());
    let screener = Screener::new(source).with_threads(1).unwrap();

    let rows = screener.run_with_cancel(
        &["UP", "DOWN", "FLAT"],
        &BREAKOUT_FILTERS,
        &ScreenOptions::default(),
        &token,
    );
    // The first symbol was already running when the token fired.
    assert_eq!(screener.source().calls(), 1);
    assert_eq!(symbols(&rows), vec!["UP"]);
}

// ──────────────────────────────────────────────
// Caching
// ──────────────────────────────────────────────

#[test]
fn cache_serves_repeat_runs() {
    let cache = Arc::new(TtlCache::default());
    let screener = Screener::new(FixtureSource::new()).with_cache(cache.clone());
    let opts = ScreenOptions::default();

    let first = screener.run(&["UP", "DOWN"], &BREAKOUT_FILTERS, &opts);
    assert_eq!(screener.source().calls(), 2);

    // Same set in another order hits the same entry.
    let second = screener.run(&["DOWN", "UP"], &BREAKOUT_FILTERS, &opts);
    assert_eq!(screener.source().calls(), 2);
    assert_eq!(first, second);
    assert_eq!(cache.len(), 1);
}

#[test]
fn cache_misses_when_options_change() {
    let cache = Arc::new(TtlCache::default());
    let screener = Screener::new(FixtureSource::new()).with_cache(cache.clone());

    screener.run(&["UP"], &BREAKOUT_FILTERS, &ScreenOptions::default());
    let strict = ScreenOptions {
        require_two_plus: true,
        ..ScreenOptions::default()
    };
    screener.run(&["UP"], &BREAKOUT_FILTERS, &strict);
    assert_eq!(screener.source().calls(), 2);
    assert_eq!(cache.len(), 2);
}

#[test]
fn cancelled_runs_are_not_cached() {
    let cache = Arc::new(TtlCache::default());
    let screener = Screener::new(FixtureSource::new()).with_cache(cache.clone());
    let token = CancelToken::new();
    token.cancel();
    screener.run_with_cancel(&["UP"], &BREAKOUT_FILTERS, &ScreenOptions::default(), &token);
    assert!(cache.is_empty());
}
