//! Screener filter evaluator.
//!
//! Evaluates a requested set of [`FilterId`]s against the latest bar and
//! returns the matching signals. After the rule table runs, the full signal
//! generator is run over the same bars and every generated signal from an
//! indicator family implied by the requested filters is appended. The union
//! can hold two differently worded signals for one underlying condition.

use crate::domain::{Bar, Direction, FilterId, IndicatorKind, Strength, TradeSignal};
use crate::indicators::value_at;
use crate::signals::rules::{
    atr_spike, crossed_above, crossed_below, price_crossed_above_within, rose_through,
    volume_confirmed, RSI_OVERBOUGHT, RSI_OVERSOLD,
};
use crate::signals::{generate_from_frame, IndicatorFrame, MIN_BARS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Window for the EMA20 cross leg of `trendReversal`.
pub const REVERSAL_CROSS_WINDOW: usize = 3;

/// Outcome of evaluating filters on one bar series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterEvaluation {
    pub matched: Vec<TradeSignal>,
    pub price: f64,
}

/// Evaluate `filters` at the latest bar of `bars`.
///
/// Fewer than [`MIN_BARS`] bars yields no matches and a price of 0.
pub fn evaluate_filters(bars: &[Bar], filters: &[FilterId]) -> FilterEvaluation {
    if bars.len() < MIN_BARS {
        return FilterEvaluation::default();
    }

    let frame = IndicatorFrame::compute(bars);
    let i = bars.len() - 1;
    let timestamp = bars[i].timestamp;

    let mut requested: Vec<FilterId> = Vec::with_capacity(filters.len());
    for f in filters {
        if !requested.contains(f) {
            requested.push(*f);
        }
    }

    let mut matched: Vec<TradeSignal> = requested
        .iter()
        .filter_map(|&f| {
            evaluate_rule(f, &frame, i).map(|(direction, indicator, strength, reason)| {
                TradeSignal::new(direction, indicator, strength, reason, timestamp)
            })
        })
        .collect();

    let families: BTreeSet<IndicatorKind> = requested
        .iter()
        .flat_map(|f| f.families().iter().copied())
        .collect();
    matched.extend(
        generate_from_frame(bars, &frame)
            .into_iter()
            .filter(|s| families.contains(&s.indicator)),
    );

    FilterEvaluation {
        matched,
        price: frame.cols.closes[i],
    }
}

type RuleHit = (Direction, IndicatorKind, Strength, String);

/// The rule table: one condition per filter, evaluated at index `i`.
fn evaluate_rule(filter: FilterId, frame: &IndicatorFrame, i: usize) -> Option<RuleHit> {
    let closes = &frame.cols.closes;
    let price = closes[i];
    let prev = i.checked_sub(1)?;

    match filter {
        FilterId::RsiOversold => {
            let rsi = value_at(&frame.rsi14, i).filter(|r| *r < RSI_OVERSOLD)?;
            Some((
                Direction::Buy,
                IndicatorKind::Rsi,
                Strength::Moderate,
                format!("RSI oversold ({rsi:.2})"),
            ))
        }
        FilterId::RsiOverbought => {
            let rsi = value_at(&frame.rsi14, i).filter(|r| *r > RSI_OVERBOUGHT)?;
            Some((
                Direction::Sell,
                IndicatorKind::Rsi,
                Strength::Moderate,
                format!("RSI overbought ({rsi:.2})"),
            ))
        }
        FilterId::EmaBullish => {
            let ema20 = value_at(&frame.ema20, i)?;
            let ema50 = value_at(&frame.ema50, i)?;
            (price > ema20 && ema20 > ema50).then(|| {
                (
                    Direction::Buy,
                    IndicatorKind::Ema,
                    Strength::Strong,
                    format!("Price {price:.2} > EMA20 {ema20:.2} > EMA50 {ema50:.2}"),
                )
            })
        }
        FilterId::EmaBearish => {
            let ema20 = value_at(&frame.ema20, i)?;
            let ema50 = value_at(&frame.ema50, i)?;
            (price < ema20 && ema20 < ema50).then(|| {
                (
                    Direction::Sell,
                    IndicatorKind::Ema,
                    Strength::Strong,
                    format!("Price {price:.2} < EMA20 {ema20:.2} < EMA50 {ema50:.2}"),
                )
            })
        }
        FilterId::MacdBullish | FilterId::MacdBearish => {
            let m = &frame.macd;
            let args = (
                value_at(&m.line, prev),
                value_at(&m.signal, prev),
                value_at(&m.line, i),
                value_at(&m.signal, i),
            );
            if filter == FilterId::MacdBullish {
                crossed_above(args.0, args.1, args.2, args.3).then(|| {
                    (
                        Direction::Buy,
                        IndicatorKind::Macd,
                        Strength::Moderate,
                        "MACD bullish crossover".to_string(),
                    )
                })
            } else {
                crossed_below(args.0, args.1, args.2, args.3).then(|| {
                    (
                        Direction::Sell,
                        IndicatorKind::Macd,
                        Strength::Moderate,
                        "MACD bearish crossover".to_string(),
                    )
                })
            }
        }
        FilterId::BbBreakoutUp => {
            let upper = value_at(&frame.bands.upper, i)?;
            (price > upper && volume_confirmed(&frame.cols.volumes, i)).then(|| {
                (
                    Direction::Buy,
                    IndicatorKind::Bollinger,
                    Strength::Strong,
                    format!("Bollinger breakout above {upper:.2} with volume"),
                )
            })
        }
        FilterId::BbBreakdown => {
            let lower = value_at(&frame.bands.lower, i)?;
            (price < lower && volume_confirmed(&frame.cols.volumes, i)).then(|| {
                (
                    Direction::Sell,
                    IndicatorKind::Bollinger,
                    Strength::Strong,
                    format!("Bollinger breakdown below {lower:.2} with volume"),
                )
            })
        }
        FilterId::AtrSpike => {
            let atr = value_at(&frame.atr14, i)?;
            // ATR carries no direction; the latest bar's move supplies one.
            let direction = if price >= closes[prev] {
                Direction::Buy
            } else {
                Direction::Sell
            };
            atr_spike(&frame.atr14, i).then(|| {
                (
                    direction,
                    IndicatorKind::Atr,
                    Strength::Moderate,
                    format!("ATR spike ({atr:.2})"),
                )
            })
        }
        FilterId::TrendReversal => {
            let rsi_up = rose_through(
                value_at(&frame.rsi14, prev),
                value_at(&frame.rsi14, i),
                RSI_OVERSOLD,
            );
            let ema_cross =
                price_crossed_above_within(closes, &frame.ema20, i, REVERSAL_CROSS_WINDOW);
            (rsi_up && ema_cross).then(|| {
                (
                    Direction::Buy,
                    IndicatorKind::Ema,
                    Strength::Strong,
                    "Trend reversal: RSI recovered above 30 and price crossed above EMA20"
                        .to_string(),
                )
            })
        }
    }
}
