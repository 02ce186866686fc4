//! Screenlab Core: indicator math, signal generation and filter evaluation.
//!
//! This crate is pure: bar series in, values out.
//! - Domain types (bars, trade signals, filter identifiers)
//! - Indicator library (SMA, EMA, RSI, MACD, Bollinger Bands, ATR)
//! - Signal generator over the latest bar, with trend and volatility context
//! - Filter evaluator sharing its rule primitives with the generator
//! - Weekly resampling for multi-timeframe confirmation

pub mod domain;
pub mod filters;
pub mod indicators;
pub mod resample;
pub mod signals;

pub use domain::{Bar, Direction, FilterId, FilterParseError, IndicatorKind, Strength, TradeSignal};
pub use filters::{evaluate_filters, FilterEvaluation};
pub use indicators::{compute_indicators, IndicatorSummary};
pub use resample::to_weekly;
pub use signals::{generate_signals, MIN_BARS};
