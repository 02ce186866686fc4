//! Average True Range (ATR).
//!
//! True range: TR[0] = high - low,
//! TR[t] = max(high - low, |high - close[t-1]|, |low - close[t-1]|).
//! ATR = EMA(TR, period). Lookback: period - 1.

use super::ema::ema;
use super::Series;

pub const DEFAULT_PERIOD: usize = 14;

/// True range per bar. The three inputs are expected to be index-aligned;
/// the output length is that of the shortest.
pub fn true_range(highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<f64> {
    let n = highs.len().min(lows.len()).min(closes.len());
    (0..n)
        .map(|i| {
            let hl = highs[i] - lows[i];
            if i == 0 {
                hl
            } else {
                let prev_close = closes[i - 1];
                hl.max((highs[i] - prev_close).abs())
                    .max((lows[i] - prev_close).abs())
            }
        })
        .collect()
}

pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Series {
    ema(&true_range(highs, lows, closes), period)
}
