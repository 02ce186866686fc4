//! Screenlab Runner: screener orchestration on top of `screenlab-core`.
//!
//! - Bar sources (CSV, Yahoo Finance, synthetic, ordered fallback)
//! - Named symbol baskets and symbol resolution
//! - Confidence scoring and multi-indicator agreement
//! - Parallel screener with cancellation and an injectable result cache
//! - TOML configuration

pub mod cache;
pub mod config;
pub mod scoring;
pub mod screener;
pub mod source;
pub mod universe;

pub use cache::{cache_key, ResultCache, TtlCache, DEFAULT_TTL};
pub use config::{CacheConfig, ConfigError, ScreenerConfig, SourceConfig};
pub use scoring::{confidence, Agreement, ConfidenceMode, ConfidenceModeParseError};
pub use screener::{
    rank, CancelToken, ScreenError, ScreenOptions, ScreenRow, Screener, DEFAULT_DAILY_BARS,
    MIN_WEEKLY_DAILY_BARS,
};
pub use source::{
    build_source, read_bars_csv, BarSource, CircuitBreaker, CsvSource, FallbackSource,
    FetchError, SourceKind, SourceKindParseError, SyntheticSource, YahooSource,
};
pub use universe::{Universe, UniverseError, MAX_SYMBOLS};
