//! CSV bar files on disk: one `{SYMBOL}.csv` per symbol.
//!
//! Expected header: `timestamp,open,high,low,close,volume`. Timestamps are
//! RFC 3339 or plain `YYYY-MM-DD` dates (taken as midnight UTC). The volume
//! column may be left empty.

use super::{take_trailing, BarSource, FetchError};
use chrono::{DateTime, NaiveDate, Utc};
use screenlab_core::Bar;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, FetchError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| FetchError::Other(format!("invalid timestamp '{raw}'")))
}

/// Read every bar in a CSV file, sorted ascending with duplicate timestamps
/// collapsed (last row wins). Rows with a NaN price are dropped.
pub fn read_bars_csv(path: &Path) -> Result<Vec<Bar>, FetchError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;

    let mut bars = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        let row = row?;
        let bar = Bar {
            timestamp: parse_timestamp(&row.timestamp)?,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.unwrap_or(0.0),
        };
        if !bar.is_void() {
            bars.push(bar);
        }
    }

    bars.sort_by_key(|b| b.timestamp);
    let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match deduped.last_mut() {
            Some(last) if last.timestamp == bar.timestamp => *last = bar,
            _ => deduped.push(bar),
        }
    }
    Ok(deduped)
}

/// Reads `{dir}/{SYMBOL}.csv`.
#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol.to_ascii_uppercase()))
    }
}

impl BarSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch_daily_bars(&self, symbol: &str, count: usize) -> Result<Vec<Bar>, FetchError> {
        let path = self.path_for(symbol);
        if !path.is_file() {
            return Err(FetchError::MissingFile {
                symbol: symbol.to_string(),
                path,
            });
        }
        let bars = read_bars_csv(&path)?;
        Ok(take_trailing(bars, count))
    }
}
