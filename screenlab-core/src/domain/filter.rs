//! Screener filter identifiers.

use super::signal::IndicatorKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One rule the screener can evaluate against the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterId {
    RsiOversold,
    RsiOverbought,
    EmaBullish,
    EmaBearish,
    MacdBullish,
    MacdBearish,
    BbBreakoutUp,
    BbBreakdown,
    AtrSpike,
    TrendReversal,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown filter '{0}'")]
pub struct FilterParseError(pub String);

impl FilterId {
    pub const ALL: [FilterId; 10] = [
        FilterId::RsiOversold,
        FilterId::RsiOverbought,
        FilterId::EmaBullish,
        FilterId::EmaBearish,
        FilterId::MacdBullish,
        FilterId::MacdBearish,
        FilterId::BbBreakoutUp,
        FilterId::BbBreakdown,
        FilterId::AtrSpike,
        FilterId::TrendReversal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterId::RsiOversold => "rsiOversold",
            FilterId::RsiOverbought => "rsiOverbought",
            FilterId::EmaBullish => "emaBullish",
            FilterId::EmaBearish => "emaBearish",
            FilterId::MacdBullish => "macdBullish",
            FilterId::MacdBearish => "macdBearish",
            FilterId::BbBreakoutUp => "bbBreakoutUp",
            FilterId::BbBreakdown => "bbBreakdown",
            FilterId::AtrSpike => "atrSpike",
            FilterId::TrendReversal => "trendReversal",
        }
    }

    /// Indicator families whose generated signals this filter pulls in.
    pub fn families(self) -> &'static [IndicatorKind] {
        match self {
            FilterId::RsiOversold | FilterId::RsiOverbought => &[IndicatorKind::Rsi],
            FilterId::EmaBullish | FilterId::EmaBearish => &[IndicatorKind::Ema],
            FilterId::MacdBullish | FilterId::MacdBearish => &[IndicatorKind::Macd],
            FilterId::BbBreakoutUp | FilterId::BbBreakdown => &[IndicatorKind::Bollinger],
            FilterId::AtrSpike => &[IndicatorKind::Atr],
            FilterId::TrendReversal => &[IndicatorKind::Rsi, IndicatorKind::Ema],
        }
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterId {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        FilterId::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| FilterParseError(trimmed.to_string()))
    }
}
