//! Confidence scoring and multi-indicator agreement.
//!
//! Agreement counts distinct indicator families per direction. A symbol has
//! two-plus agreement when either direction is backed by at least two
//! families. The dominant direction is the one with more families; ties go
//! to the direction with more signals, then to BUY.

use screenlab_core::{Direction, IndicatorKind, TradeSignal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// How matched signal strengths fold into one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceMode {
    /// Mean of strength weights.
    #[default]
    Simple,
    /// Simple score scaled by the share of families that back the dominant
    /// direction.
    FamilyWeighted,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown confidence mode '{0}'")]
pub struct ConfidenceModeParseError(pub String);

impl std::str::FromStr for ConfidenceMode {
    type Err = ConfidenceModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "simple" => Ok(Self::Simple),
            "family_weighted" => Ok(Self::FamilyWeighted),
            other => Err(ConfidenceModeParseError(other.to_string())),
        }
    }
}

/// Family counts per direction for one set of matched signals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Agreement {
    pub buy_families: BTreeSet<IndicatorKind>,
    pub sell_families: BTreeSet<IndicatorKind>,
    pub buy_signals: usize,
    pub sell_signals: usize,
}

impl Agreement {
    pub fn from_signals(signals: &[TradeSignal]) -> Self {
        let mut agreement = Self::default();
        for s in signals {
            match s.direction {
                Direction::Buy => {
                    agreement.buy_families.insert(s.indicator);
                    agreement.buy_signals += 1;
                }
                Direction::Sell => {
                    agreement.sell_families.insert(s.indicator);
                    agreement.sell_signals += 1;
                }
            }
        }
        agreement
    }

    /// At least two families agree on one direction.
    pub fn two_plus(&self) -> bool {
        self.buy_families.len() >= 2 || self.sell_families.len() >= 2
    }

    /// `None` when there are no signals.
    pub fn dominant(&self) -> Option<Direction> {
        if self.buy_signals == 0 && self.sell_signals == 0 {
            return None;
        }
        let buy = (self.buy_families.len(), self.buy_signals);
        let sell = (self.sell_families.len(), self.sell_signals);
        if sell > buy {
            Some(Direction::Sell)
        } else {
            Some(Direction::Buy)
        }
    }

    fn families_for(&self, direction: Direction) -> &BTreeSet<IndicatorKind> {
        match direction {
            Direction::Buy => &self.buy_families,
            Direction::Sell => &self.sell_families,
        }
    }

    /// Distinct families across both directions.
    pub fn total_families(&self) -> usize {
        self.buy_families.union(&self.sell_families).count()
    }
}

/// Aggregate strength of `signals` in [0, 1]. Empty input scores 0.
pub fn confidence(signals: &[TradeSignal], mode: ConfidenceMode) -> f64 {
    if signals.is_empty() {
        return 0.0;
    }
    let simple =
        signals.iter().map(|s| s.strength.weight()).sum::<f64>() / signals.len() as f64;

    match mode {
        ConfidenceMode::Simple => simple,
        ConfidenceMode::FamilyWeighted => {
            let agreement = Agreement::from_signals(signals);
            let total = agreement.total_families();
            match agreement.dominant() {
                Some(direction) if total > 0 => {
                    let backing = agreement.families_for(direction).len();
                    simple * backing as f64 / total as f64
                }
                _ => 0.0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use screenlab_core::Strength;

    fn sig(direction: Direction, indicator: IndicatorKind, strength: Strength) -> TradeSignal {
        TradeSignal::new(
            direction,
            indicator,
            strength,
            "test",
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn empty_scores_zero() {
        assert_eq!(confidence(&[], ConfidenceMode::Simple), 0.0);
        assert_eq!(confidence(&[], ConfidenceMode::FamilyWeighted), 0.0);
        assert_eq!(Agreement::from_signals(&[]).dominant(), None);
    }

    #[test]
    fn simple_is_mean_of_weights() {
        let signals = [
            sig(Direction::Buy, IndicatorKind::Rsi, Strength::Weak),
            sig(Direction::Buy, IndicatorKind::Ema, Strength::Strong),
        ];
        let c = confidence(&signals, ConfidenceMode::Simple);
        assert!((c - 0.8).abs() < 1e-12);
    }

    #[test]
    fn single_family_is_not_two_plus() {
        let signals = [
            sig(Direction::Buy, IndicatorKind::Rsi, Strength::Strong),
            sig(Direction::Buy, IndicatorKind::Rsi, Strength::Moderate),
        ];
        assert!(!Agreement::from_signals(&signals).two_plus());
    }

    #[test]
    fn families_split_across_directions_are_not_two_plus() {
        let signals = [
            sig(Direction::Buy, IndicatorKind::Rsi, Strength::Strong),
            sig(Direction::Sell, IndicatorKind::Macd, Strength::Strong),
        ];
        assert!(!Agreement::from_signals(&signals).two_plus());
    }

    #[test]
    fn two_families_same_direction_agree() {
        let signals = [
            sig(Direction::Sell, IndicatorKind::Rsi, Strength::Weak),
            sig(Direction::Sell, IndicatorKind::Bollinger, Strength::Strong),
        ];
        let a = Agreement::from_signals(&signals);
        assert!(a.two_plus());
        assert_eq!(a.dominant(), Some(Direction::Sell));
    }

    #[test]
    fn dominant_tie_breaks_on_signal_count_then_buy() {
        let signals = [
            sig(Direction::Buy, IndicatorKind::Rsi, Strength::Weak),
            sig(Direction::Sell, IndicatorKind::Ema, Strength::Weak),
            sig(Direction::Sell, IndicatorKind::Ema, Strength::Weak),
        ];
        assert_eq!(Agreement::from_signals(&signals).dominant(), Some(Direction::Sell));

        let even = [
            sig(Direction::Buy, IndicatorKind::Rsi, Strength::Weak),
            sig(Direction::Sell, IndicatorKind::Ema, Strength::Weak),
        ];
        assert_eq!(Agreement::from_signals(&even).dominant(), Some(Direction::Buy));
    }

    #[test]
    fn family_weighted_scales_by_backing_share() {
        // Buy: RSI + EMA, Sell: MACD -> 2 of 3 families back the dominant side.
        let signals = [
            sig(Direction::Buy, IndicatorKind::Rsi, Strength::Strong),
            sig(Direction::Buy, IndicatorKind::Ema, Strength::Strong),
            sig(Direction::Sell, IndicatorKind::Macd, Strength::Strong),
        ];
        let c = confidence(&signals, ConfidenceMode::FamilyWeighted);
        assert!((c - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn family_weighted_equals_simple_when_unanimous() {
        let signals = [
            sig(Direction::Buy, IndicatorKind::Rsi, Strength::Moderate),
            sig(Direction::Buy, IndicatorKind::Atr, Strength::Strong),
        ];
        assert_eq!(
            confidence(&signals, ConfidenceMode::FamilyWeighted),
            confidence(&signals, ConfidenceMode::Simple)
        );
    }

    #[test]
    fn mode_parses_kebab_and_snake() {
        assert_eq!("family-weighted".parse::<ConfidenceMode>(), Ok(ConfidenceMode::FamilyWeighted));
        assert_eq!("SIMPLE".parse::<ConfidenceMode>(), Ok(ConfidenceMode::Simple));
        assert_eq!(
            "median".parse::<ConfidenceMode>(),
            Err(ConfidenceModeParseError("median".into()))
        );
    }
}
