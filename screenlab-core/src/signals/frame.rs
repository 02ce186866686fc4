//! Precomputed indicator frame for one bar series.
//!
//! Built once per evaluation, then queried at the latest index by both the
//! signal generator and the filter evaluator.

use crate::domain::{Bar, PriceColumns};
use crate::indicators::{
    atr, bollinger, ema, macd, rsi, sma, value_at, BollingerBands, Macd, Series,
};

#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    pub cols: PriceColumns,
    pub rsi14: Series,
    pub ema20: Series,
    pub ema50: Series,
    pub sma50: Series,
    pub sma200: Series,
    pub macd: Macd,
    pub bands: BollingerBands,
    pub atr14: Series,
}

impl IndicatorFrame {
    pub fn compute(bars: &[Bar]) -> Self {
        let cols = PriceColumns::from_bars(bars);
        let closes = &cols.closes;
        Self {
            rsi14: rsi(closes, 14),
            ema20: ema(closes, 20),
            ema50: ema(closes, 50),
            sma50: sma(closes, 50),
            sma200: sma(closes, 200),
            macd: macd(closes, 12, 26, 9),
            bands: bollinger(closes, 20, 2.0),
            atr14: atr(&cols.highs, &cols.lows, closes, 14),
            cols,
        }
    }

    pub fn len(&self) -> usize {
        self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }

    /// Index of the latest bar.
    pub fn last_index(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }

    /// SMA50 above SMA200 at `i`. False while either is still warming up.
    pub fn is_uptrend(&self, i: usize) -> bool {
        matches!(
            (value_at(&self.sma50, i), value_at(&self.sma200, i)),
            (Some(fast), Some(slow)) if fast > slow
        )
    }
}
