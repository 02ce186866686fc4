//! Per-symbol indicator summary for detail views.

use super::{ema, last_value, rsi, sma, value_at, Series};
use crate::signals::rules::{crossed_above, crossed_below};
use serde::{Deserialize, Serialize};

/// Direction of the SMA20 / EMA50 crossover at the latest index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crossover {
    Bullish,
    Bearish,
    None,
}

/// Latest defined value of each summary indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentValues {
    pub price: Option<f64>,
    pub sma20: Option<f64>,
    pub ema50: Option<f64>,
    pub rsi14: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSummary {
    pub sma20: Series,
    pub ema50: Series,
    pub rsi14: Series,
    pub crossover: Crossover,
    pub current: CurrentValues,
}

/// SMA20, EMA50 and RSI14 over a close series, plus the SMA20/EMA50
/// crossover state at the latest bar.
pub fn compute_indicators(closes: &[f64]) -> IndicatorSummary {
    let sma20 = sma(closes, 20);
    let ema50 = ema(closes, 50);
    let rsi14 = rsi(closes, 14);

    let crossover = match closes.len().checked_sub(1) {
        Some(i) if i >= 1 => {
            let (fast_prev, slow_prev) = (value_at(&sma20, i - 1), value_at(&ema50, i - 1));
            let (fast, slow) = (value_at(&sma20, i), value_at(&ema50, i));
            if crossed_above(fast_prev, slow_prev, fast, slow) {
                Crossover::Bullish
            } else if crossed_below(fast_prev, slow_prev, fast, slow) {
                Crossover::Bearish
            } else {
                Crossover::None
            }
        }
        _ => Crossover::None,
    };

    let current = CurrentValues {
        price: closes.last().copied(),
        sma20: last_value(&sma20),
        ema50: last_value(&ema50),
        rsi14: last_value(&rsi14),
    };

    IndicatorSummary {
        sma20,
        ema50,
        rsi14,
        crossover,
        current,
    }
}
