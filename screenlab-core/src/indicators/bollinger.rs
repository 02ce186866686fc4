//! Bollinger Bands.
//!
//! middle = SMA(period), upper/lower = middle ± k * population stdev over the
//! same trailing window. Lookback: period - 1.

use super::sma::sma;
use super::Series;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_K: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
}

pub fn bollinger(values: &[f64], period: usize, k: f64) -> BollingerBands {
    let n = values.len();
    let middle = sma(values, period);
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];

    for i in 0..n {
        let Some(mean) = middle[i] else { continue };
        let window = &values[(i + 1 - period)..=i];
        let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
        let std = variance.sqrt();
        upper[i] = Some(mean + k * std);
        lower[i] = Some(mean - k * std);
    }

    BollingerBands {
        upper,
        middle,
        lower,
    }
}
