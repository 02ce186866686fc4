//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = close[t] * k + EMA[t-1] * (1 - k), k = 2 / (period + 1)
//! Seed: EMA[period-1] = SMA of first `period` values.
//! Lookback: period - 1.

use super::Series;

/// EMA over `values`. Empty input gives empty output; `period == 0` or a
/// series shorter than `period` gives all `None`.
pub fn ema(values: &[f64], period: usize) -> Series {
    let n = values.len();
    let mut result = vec![None; n];

    if period == 0 || n < period {
        return result;
    }

    let k = 2.0 / (period as f64 + 1.0);

    let seed = values[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..n {
        let next = values[i] * k + prev * (1.0 - k);
        result[i] = Some(next);
        prev = next;
    }

    result
}
