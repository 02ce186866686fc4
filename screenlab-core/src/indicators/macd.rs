//! Moving Average Convergence Divergence (MACD).
//!
//! line      = EMA(fast) - EMA(slow)
//! signal    = EMA(line, signal), warmup positions of `line` counted as 0
//! histogram = line - signal

use super::ema::ema;
use super::Series;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

/// The three MACD series, each aligned with the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub line: Series,
    pub signal: Series,
    pub histogram: Series,
}

pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);

    let line: Series = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    // The signal line is smoothed over the full-length line with warmup
    // positions zero-filled, so it is defined well before the line itself.
    let filled: Vec<f64> = line.iter().map(|v| v.unwrap_or(0.0)).collect();
    let signal_line = ema(&filled, signal);

    let histogram = line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(m - s),
            _ => None,
        })
        .collect();

    Macd {
        line,
        signal: signal_line,
        histogram,
    }
}

/// MACD with the conventional 12/26/9 parameters.
pub fn macd_default(values: &[f64]) -> Macd {
    macd(values, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
