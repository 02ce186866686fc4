//! Signal generation at the latest bar.
//!
//! Runs the indicator library over a bar series and reports discrete
//! crossover, threshold and breakout events between the previous and the
//! latest bar. Nothing here looks further back than the two most recent
//! indices (except through the indicators' own lookback), and no state is kept
//! between calls.

pub mod frame;
pub mod rules;

pub use frame::IndicatorFrame;

use crate::domain::{Bar, Direction, IndicatorKind, Strength, TradeSignal};
use crate::indicators::value_at;
use rules::{
    crossed_above, crossed_below, fell_through, price_crossed_above, price_crossed_below,
    rose_through, volume_confirmed, RSI_OVERBOUGHT, RSI_OVERSOLD,
};

/// Bars required before any signal is produced. Not configurable.
pub const MIN_BARS: usize = 30;

/// Generate the trade signals that fire at the latest bar.
///
/// Returns an empty list for fewer than [`MIN_BARS`] bars.
pub fn generate_signals(bars: &[Bar]) -> Vec<TradeSignal> {
    if bars.len() < MIN_BARS {
        return Vec::new();
    }
    let frame = IndicatorFrame::compute(bars);
    generate_from_frame(bars, &frame)
}

/// Same as [`generate_signals`] over an already computed frame for `bars`.
pub fn generate_from_frame(bars: &[Bar], frame: &IndicatorFrame) -> Vec<TradeSignal> {
    if bars.len() < MIN_BARS || frame.len() != bars.len() {
        return Vec::new();
    }

    let i = bars.len() - 1;
    let prev = i - 1;
    let timestamp = bars[i].timestamp;
    let closes = &frame.cols.closes;
    let close = closes[i];

    let mut signals = Vec::new();
    let mut push = |direction, indicator, strength, reason: String| {
        signals.push(TradeSignal::new(direction, indicator, strength, reason, timestamp));
    };

    // RSI leaving oversold / overbought territory.
    let (rsi_prev, rsi) = (value_at(&frame.rsi14, prev), value_at(&frame.rsi14, i));
    if let Some(curr) = rsi.filter(|_| rose_through(rsi_prev, rsi, RSI_OVERSOLD)) {
        let strength = if curr < 40.0 {
            Strength::Moderate
        } else {
            Strength::Weak
        };
        push(
            Direction::Buy,
            IndicatorKind::Rsi,
            strength,
            format!("RSI crossed above {RSI_OVERSOLD} ({curr:.2})"),
        );
    }
    if let Some(curr) = rsi.filter(|_| fell_through(rsi_prev, rsi, RSI_OVERBOUGHT)) {
        let strength = if curr > 60.0 {
            Strength::Moderate
        } else {
            Strength::Weak
        };
        push(
            Direction::Sell,
            IndicatorKind::Rsi,
            strength,
            format!("RSI crossed below {RSI_OVERBOUGHT} ({curr:.2})"),
        );
    }

    // Price crossing EMA20 (moderate) and EMA50 (strong).
    for (line, period, strength) in [
        (&frame.ema20, 20, Strength::Moderate),
        (&frame.ema50, 50, Strength::Strong),
    ] {
        if price_crossed_above(closes, line, i) {
            push(
                Direction::Buy,
                IndicatorKind::Ema,
                strength,
                format!("Price {close:.2} crossed above EMA{period}"),
            );
        } else if price_crossed_below(closes, line, i) {
            push(
                Direction::Sell,
                IndicatorKind::Ema,
                strength,
                format!("Price {close:.2} crossed below EMA{period}"),
            );
        }
    }

    // MACD line crossing its signal line.
    let m = &frame.macd;
    let (line_prev, sig_prev) = (value_at(&m.line, prev), value_at(&m.signal, prev));
    let (line, sig) = (value_at(&m.line, i), value_at(&m.signal, i));
    if crossed_above(line_prev, sig_prev, line, sig) {
        push(
            Direction::Buy,
            IndicatorKind::Macd,
            Strength::Moderate,
            "MACD crossed above signal line".to_string(),
        );
    } else if crossed_below(line_prev, sig_prev, line, sig) {
        push(
            Direction::Sell,
            IndicatorKind::Macd,
            Strength::Moderate,
            "MACD crossed below signal line".to_string(),
        );
    }

    // Bollinger breakout, confirmed by volume.
    if volume_confirmed(&frame.cols.volumes, i) {
        if let Some(upper) = value_at(&frame.bands.upper, i).filter(|u| close > *u) {
            push(
                Direction::Buy,
                IndicatorKind::Bollinger,
                Strength::Strong,
                format!("Close {close:.2} broke above upper band {upper:.2} on high volume"),
            );
        }
        if let Some(lower) = value_at(&frame.bands.lower, i).filter(|l| close < *l) {
            push(
                Direction::Sell,
                IndicatorKind::Bollinger,
                Strength::Strong,
                format!("Close {close:.2} broke below lower band {lower:.2} on high volume"),
            );
        }
    }

    apply_trend_context(&mut signals, frame.is_uptrend(i));
    apply_volatility_context(&mut signals, close - closes[prev], value_at(&frame.atr14, i));

    tracing::debug!(count = signals.len(), bars = bars.len(), "generated signals");
    signals
}

/// In an uptrend weak BUYs become moderate; otherwise weak SELLs do.
fn apply_trend_context(signals: &mut [TradeSignal], uptrend: bool) {
    let favoured = if uptrend {
        Direction::Buy
    } else {
        Direction::Sell
    };
    for signal in signals.iter_mut() {
        if signal.direction == favoured && signal.strength == Strength::Weak {
            signal.strength = Strength::Moderate;
        }
    }
}

/// A bar-over-bar move larger than the current ATR makes every signal strong.
fn apply_volatility_context(signals: &mut [TradeSignal], move_size: f64, atr: Option<f64>) {
    if let Some(atr) = atr {
        if move_size.abs() > atr {
            for signal in signals.iter_mut() {
                signal.strength = Strength::Strong;
            }
        }
    }
}
