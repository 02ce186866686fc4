//! Fixed-count bar resampling.
//!
//! Daily bars are grouped into "weeks" of five consecutive bars (no calendar
//! alignment). A trailing group with fewer than five bars is kept.

use crate::domain::Bar;

/// Trading days per weekly bar.
pub const DAYS_PER_WEEK: usize = 5;

/// Merge consecutive groups of `group` bars into one bar each:
/// open = first, high = max, low = min, close = last, volume = sum,
/// timestamp = first bar's timestamp.
pub fn resample(bars: &[Bar], group: usize) -> Vec<Bar> {
    if group == 0 {
        return Vec::new();
    }
    bars.chunks(group)
        .filter_map(|chunk| {
            let (first, rest) = chunk.split_first()?;
            let mut merged = first.clone();
            for bar in rest {
                merged.high = merged.high.max(bar.high);
                merged.low = merged.low.min(bar.low);
                merged.close = bar.close;
                merged.volume += bar.volume;
            }
            Some(merged)
        })
        .collect()
}

/// Weekly bars from daily bars.
pub fn to_weekly(daily: &[Bar]) -> Vec<Bar> {
    resample(daily, DAYS_PER_WEEK)
}
