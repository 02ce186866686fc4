//! Screener configuration file.
//!
//! ```toml
//! threads = 4
//!
//! [options]
//! require_two_plus = true
//! min_confidence = 0.7
//! confidence_mode = "family_weighted"
//! daily_bars = 160
//!
//! [cache]
//! enabled = true
//! ttl_secs = 60
//!
//! [source]
//! kind = "csv"
//! csv_dir = "data/bars"
//!
//! [universe]
//! WATCHLIST = ["AAPL", "MSFT"]
//! ```
//!
//! Every section is optional. Baskets under `[universe]` are added to the
//! built-in ones, replacing any with the same code.

use crate::cache::{TtlCache, DEFAULT_TTL};
use crate::screener::ScreenOptions;
use crate::source::SourceKind;
use crate::universe::Universe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_TTL.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub csv_dir: Option<PathBuf>,
}

/// Top-level screener configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    pub options: ScreenOptions,
    pub cache: CacheConfig,
    pub source: SourceConfig,
    /// Worker threads; `None` uses the global rayon pool.
    pub threads: Option<usize>,
    pub universe: BTreeMap<String, Vec<String>>,
}

impl ScreenerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.options
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("[options] {e}")))?;
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid("threads must be at least 1".into()));
        }
        if self.source.kind == SourceKind::Csv && self.source.csv_dir.is_none() {
            return Err(ConfigError::Invalid(
                "source.kind = \"csv\" requires source.csv_dir".into(),
            ));
        }
        Ok(())
    }

    /// Built-in baskets with the `[universe]` overrides applied.
    pub fn universe(&self) -> Universe {
        let mut universe = Universe::default_us();
        universe.merge(Universe::from_baskets(self.universe.clone()));
        universe
    }

    /// The configured cache, or `None` when disabled.
    pub fn build_cache(&self) -> Option<TtlCache> {
        self.cache
            .enabled
            .then(|| TtlCache::new(Duration::from_secs(self.cache.ttl_secs)))
    }
}
