//! Domain types: bars, trade signals, filter identifiers.

pub mod bar;
pub mod filter;
pub mod signal;

pub use bar::{Bar, PriceColumns};
pub use filter::{FilterId, FilterParseError};
pub use signal::{Direction, IndicatorKind, Strength, TradeSignal};
