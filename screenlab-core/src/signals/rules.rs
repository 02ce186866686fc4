//! Rule primitives shared by the signal generator and the filter evaluator.
//!
//! Both consumers express their conditions through these helpers so a
//! crossover or a volume confirmation means the same thing everywhere.

use crate::indicators::value_at;

/// Volume must exceed this multiple of its trailing average to confirm a breakout.
pub const VOLUME_CONFIRM_MULTIPLE: f64 = 1.5;
/// Trailing window for average volume.
pub const VOLUME_WINDOW: usize = 20;
/// ATR must exceed this multiple of its trailing mean to count as a spike.
pub const ATR_SPIKE_MULTIPLE: f64 = 1.5;
/// Trailing window for the ATR mean.
pub const ATR_SPIKE_WINDOW: usize = 20;

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// `a` moved from at-or-below `b` to strictly above it. False if any input is missing.
pub fn crossed_above(
    a_prev: Option<f64>,
    b_prev: Option<f64>,
    a: Option<f64>,
    b: Option<f64>,
) -> bool {
    match (a_prev, b_prev, a, b) {
        (Some(ap), Some(bp), Some(a), Some(b)) => ap <= bp && a > b,
        _ => false,
    }
}

/// `a` moved from at-or-above `b` to strictly below it. False if any input is missing.
pub fn crossed_below(
    a_prev: Option<f64>,
    b_prev: Option<f64>,
    a: Option<f64>,
    b: Option<f64>,
) -> bool {
    match (a_prev, b_prev, a, b) {
        (Some(ap), Some(bp), Some(a), Some(b)) => ap >= bp && a < b,
        _ => false,
    }
}

/// Level crossed upward: `prev < level && curr >= level`.
pub fn rose_through(prev: Option<f64>, curr: Option<f64>, level: f64) -> bool {
    matches!((prev, curr), (Some(p), Some(c)) if p < level && c >= level)
}

/// Level crossed downward: `prev > level && curr <= level`.
pub fn fell_through(prev: Option<f64>, curr: Option<f64>, level: f64) -> bool {
    matches!((prev, curr), (Some(p), Some(c)) if p > level && c <= level)
}

/// Close crossed above a series between `i - 1` and `i`.
pub fn price_crossed_above(closes: &[f64], line: &[Option<f64>], i: usize) -> bool {
    if i == 0 || i >= closes.len() {
        return false;
    }
    crossed_above(
        Some(closes[i - 1]),
        value_at(line, i - 1),
        Some(closes[i]),
        value_at(line, i),
    )
}

/// Close crossed below a series between `i - 1` and `i`.
pub fn price_crossed_below(closes: &[f64], line: &[Option<f64>], i: usize) -> bool {
    if i == 0 || i >= closes.len() {
        return false;
    }
    crossed_below(
        Some(closes[i - 1]),
        value_at(line, i - 1),
        Some(closes[i]),
        value_at(line, i),
    )
}

/// Any upward price cross of `line` on one of the last `bars` bars ending at `i`.
pub fn price_crossed_above_within(
    closes: &[f64],
    line: &[Option<f64>],
    i: usize,
    bars: usize,
) -> bool {
    (0..bars)
        .filter_map(|back| i.checked_sub(back))
        .any(|j| price_crossed_above(closes, line, j))
}

/// Mean volume over the trailing window ending at `i` (inclusive).
pub fn average_volume(volumes: &[f64], i: usize) -> Option<f64> {
    if i >= volumes.len() {
        return None;
    }
    let start = (i + 1).saturating_sub(VOLUME_WINDOW);
    let window = &volumes[start..=i];
    Some(window.iter().sum::<f64>() / window.len() as f64)
}

/// Volume at `i` is above `VOLUME_CONFIRM_MULTIPLE` times its trailing average.
/// A zero average never confirms.
pub fn volume_confirmed(volumes: &[f64], i: usize) -> bool {
    match average_volume(volumes, i) {
        Some(avg) if avg > 0.0 => volumes[i] > VOLUME_CONFIRM_MULTIPLE * avg,
        _ => false,
    }
}

/// ATR at `i` exceeds `ATR_SPIKE_MULTIPLE` times the mean of the last
/// `ATR_SPIKE_WINDOW` defined ATR values (current included).
pub fn atr_spike(atr: &[Option<f64>], i: usize) -> bool {
    let Some(current) = value_at(atr, i) else {
        return false;
    };
    let start = (i + 1).saturating_sub(ATR_SPIKE_WINDOW);
    let defined: Vec<f64> = atr[start..=i].iter().flatten().copied().collect();
    if defined.is_empty() {
        return false;
    }
    let mean = defined.iter().sum::<f64>() / defined.len() as f64;
    mean > 0.0 && current > ATR_SPIKE_MULTIPLE * mean
}
