//! Relative Strength Index (RSI).
//!
//! Simple (non-Wilder) averaging: at each index the average gain and average
//! loss are plain means over the trailing `period` price changes.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss), rounded to 2 decimals.
//! Lookback: period. Edge case: avg_loss == 0 → RSI = 100.

use super::Series;

/// Default RSI lookback.
pub const DEFAULT_PERIOD: usize = 14;

/// RSI over `values`. Needs at least `period + 1` values, else all `None`.
/// Index 0 is always `None` since it has no prior change.
pub fn rsi(values: &[f64], period: usize) -> Series {
    let n = values.len();
    let mut result = vec![None; n];

    if period == 0 || n < period + 1 {
        return result;
    }

    // gains[j] / losses[j] describe the change from values[j-1] to values[j].
    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for j in 1..n {
        let delta = values[j] - values[j - 1];
        if delta > 0.0 {
            gains[j] = delta;
        } else {
            losses[j] = -delta;
        }
    }

    for i in period..n {
        let window = (i + 1 - period)..=i;
        let avg_gain = gains[window.clone()].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[window].iter().sum::<f64>() / period as f64;

        let value = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };
        result[i] = Some(round2(value));
    }

    result
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
