//! Simple Moving Average (SMA).
//!
//! Rolling mean of the trailing `period` values.
//! Lookback: period - 1 (first valid value at index period-1).

use super::Series;

/// SMA over `values`. All `None` when `period == 0` or `period > values.len()`.
pub fn sma(values: &[f64], period: usize) -> Series {
    let n = values.len();
    let mut result = vec![None; n];

    if period == 0 || period > n {
        return result;
    }

    // Initial window sum, then roll the window forward.
    let mut sum: f64 = values[..period].iter().sum();
    result[period - 1] = Some(sum / period as f64);

    for i in period..n {
        sum += values[i] - values[i - period];
        result[i] = Some(sum / period as f64);
    }

    result
}
