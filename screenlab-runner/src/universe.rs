//! Universe of named symbol baskets.
//!
//! A basket code (`DOW30`, `NASDAQ100`, ...) expands to its member tickers
//! when resolving screener input. Baskets load from TOML:
//!
//! ```toml
//! [baskets]
//! MEGACAPS = ["AAPL", "MSFT", "NVDA"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Hard cap on resolved symbols per screener run.
pub const MAX_SYMBOLS: usize = 100;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("read universe file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse universe TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize universe: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Named baskets keyed by upper-case code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    #[serde(default)]
    pub baskets: BTreeMap<String, Vec<String>>,
}

fn owned(tickers: &[&str]) -> Vec<String> {
    tickers.iter().map(|t| t.to_string()).collect()
}

impl Universe {
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        let parsed: Self = toml::from_str(content)?;
        Ok(Self::from_baskets(parsed.baskets))
    }

    /// Build from raw baskets, normalizing codes and tickers to upper case.
    pub fn from_baskets(baskets: BTreeMap<String, Vec<String>>) -> Self {
        let baskets = baskets
            .into_iter()
            .map(|(code, tickers)| {
                let tickers = tickers
                    .iter()
                    .map(|t| t.trim().to_ascii_uppercase())
                    .filter(|t| !t.is_empty())
                    .collect();
                (code.trim().to_ascii_uppercase(), tickers)
            })
            .collect();
        Self { baskets }
    }

    pub fn to_toml(&self) -> Result<String, UniverseError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Add or replace baskets from `other`.
    pub fn merge(&mut self, other: Universe) {
        self.baskets.extend(other.baskets);
    }

    /// Members of a basket, looked up case-insensitively.
    pub fn basket(&self, code: &str) -> Option<&[String]> {
        self.baskets
            .get(&code.trim().to_ascii_uppercase())
            .map(|v| v.as_slice())
    }

    pub fn basket_codes(&self) -> Vec<&str> {
        self.baskets.keys().map(|s| s.as_str()).collect()
    }

    pub fn ticker_count(&self) -> usize {
        self.baskets.values().map(|v| v.len()).sum()
    }

    /// Resolve screener input tokens into a symbol list.
    ///
    /// Tokens are trimmed and upper-cased; basket codes expand to their
    /// members. Duplicates keep their first position and the result is
    /// capped at [`MAX_SYMBOLS`].
    pub fn resolve<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        fn push(sym: &str, out: &mut Vec<String>) {
            if out.len() < MAX_SYMBOLS && !out.iter().any(|s| s == sym) {
                out.push(sym.to_string());
            }
        }

        let mut out: Vec<String> = Vec::new();

        for token in tokens {
            let token = token.as_ref().trim().to_ascii_uppercase();
            if token.is_empty() {
                continue;
            }
            match self.baskets.get(&token) {
                Some(members) => {
                    for m in members {
                        push(m, &mut out);
                    }
                }
                None => push(&token, &mut out),
            }
            if out.len() >= MAX_SYMBOLS {
                tracing::debug!(cap = MAX_SYMBOLS, "symbol list truncated");
                break;
            }
        }
        out
    }

    /// Built-in US baskets.
    pub fn default_us() -> Self {
        let mut baskets = BTreeMap::new();

        baskets.insert(
            "DOW30".into(),
            owned(&[
                "AAPL", "AMGN", "AMZN", "AXP", "BA", "CAT", "CRM", "CSCO", "CVX", "DIS", "GS",
                "HD", "HON", "IBM", "JNJ", "JPM", "KO", "MCD", "MMM", "MRK", "MSFT", "NKE",
                "NVDA", "PG", "SHW", "TRV", "UNH", "V", "VZ", "WMT",
            ]),
        );

        baskets.insert(
            "NASDAQ100".into(),
            owned(&[
                "AAPL", "MSFT", "NVDA", "AMZN", "META", "AVGO", "GOOGL", "GOOG", "TSLA", "COST",
                "NFLX", "AMD", "PEP", "ADBE", "CSCO", "TMUS", "LIN", "INTU", "QCOM", "TXN",
                "AMGN", "ISRG", "CMCSA", "BKNG", "AMAT", "HON", "VRTX", "PANW", "ADP", "GILD",
                "SBUX", "MU", "ADI", "LRCX", "MELI", "INTC", "KLAC", "MDLZ", "REGN", "CTAS",
                "SNPS", "CDNS", "PYPL", "MAR", "CRWD", "ORLY", "ASML", "CSX", "ABNB", "FTNT",
            ]),
        );

        baskets.insert(
            "SP500".into(),
            owned(&[
                "AAPL", "MSFT", "NVDA", "AMZN", "META", "GOOGL", "BRK.B", "LLY", "AVGO", "JPM",
                "TSLA", "UNH", "XOM", "V", "PG", "MA", "JNJ", "COST", "HD", "MRK", "ABBV",
                "WMT", "NFLX", "CVX", "BAC", "KO", "CRM", "AMD", "PEP", "TMO", "ORCL", "LIN",
                "ADBE", "ACN", "MCD", "CSCO", "ABT", "WFC", "GE", "DHR", "TXN", "QCOM", "PM",
                "INTU", "CAT", "IBM", "AMGN", "VZ", "DIS", "GS",
            ]),
        );

        baskets.insert(
            "SECTOR_ETFS".into(),
            owned(&[
                "XLB", "XLC", "XLE", "XLF", "XLI", "XLK", "XLP", "XLRE", "XLU", "XLV", "XLY",
            ]),
        );

        Self { baskets }
    }
}
