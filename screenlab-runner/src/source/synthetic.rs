//! Deterministic synthetic bars for offline runs and demos.

use super::{BarSource, FetchError};
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use screenlab_core::Bar;

/// Random walk seeded from the BLAKE3 hash of the symbol, so the same
/// symbol always yields the same prices.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    end: Option<NaiveDate>,
}

impl SyntheticSource {
    /// Series ending at the most recent weekday.
    pub fn new() -> Self {
        Self { end: None }
    }

    /// Series ending at (or just before) `end`.
    pub fn ending_at(end: NaiveDate) -> Self {
        Self { end: Some(end) }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The `count` weekdays ending at `end`, ascending.
fn trading_days(end: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut current = end;
    while days.len() < count {
        if !is_weekend(current) {
            days.push(current);
        }
        current -= Duration::days(1);
    }
    days.reverse();
    days
}

pub fn generate_synthetic_bars(symbol: &str, end: NaiveDate, count: usize) -> Vec<Bar> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);
    let mut price = 100.0_f64;

    trading_days(end, count)
        .into_iter()
        .filter_map(|date| {
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000.0..5_000_000.0_f64).round();
            price = close;

            let timestamp = date.and_hms_opt(0, 0, 0)?.and_utc();
            Some(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            })
        })
        .collect()
}

impl BarSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_daily_bars(&self, symbol: &str, count: usize) -> Result<Vec<Bar>, FetchError> {
        let end = self.end.unwrap_or_else(|| Utc::now().date_naive());
        Ok(generate_synthetic_bars(symbol, end, count))
    }
}
