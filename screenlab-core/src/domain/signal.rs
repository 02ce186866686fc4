//! Trade signals produced at the latest bar of a series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which way a signal points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

/// Indicator family a signal originates from.
///
/// Families are the unit of "independent confirmation" for screener agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndicatorKind {
    Rsi,
    Ema,
    Macd,
    Bollinger,
    Atr,
}

impl IndicatorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Ema => "EMA",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::Bollinger => "BOLLINGER",
            IndicatorKind::Atr => "ATR",
        }
    }
}

/// Signal strength. Ordered weak < moderate < strong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Moderate,
    Strong,
}

impl Strength {
    /// Weight used by confidence scoring.
    pub fn weight(self) -> f64 {
        match self {
            Strength::Weak => 0.6,
            Strength::Moderate => 0.8,
            Strength::Strong => 1.0,
        }
    }
}

/// A discrete trade signal at one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub direction: Direction,
    pub indicator: IndicatorKind,
    pub strength: Strength,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl TradeSignal {
    pub fn new(
        direction: Direction,
        indicator: IndicatorKind,
        strength: Strength,
        reason: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            direction,
            indicator,
            strength,
            reason: reason.into(),
            timestamp,
        }
    }
}
