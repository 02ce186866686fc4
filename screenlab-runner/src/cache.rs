//! Short-lived screener result cache.
//!
//! The screener takes an optional [`ResultCache`]; nothing here is global.
//! Entries are keyed by a BLAKE3 hash of the resolved symbol set, the
//! filter set and the screen options, so two runs over the same inputs in
//! different order share an entry.

use crate::screener::{ScreenOptions, ScreenRow};
use screenlab_core::FilterId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Default time-to-live for cached screener results.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Cache collaborator for screener results.
pub trait ResultCache: Send + Sync {
    /// Rows stored under `key`, if present and not expired.
    fn get(&self, key: &str) -> Option<Vec<ScreenRow>>;

    fn set(&self, key: &str, rows: Vec<ScreenRow>);

    fn ttl(&self) -> Duration;
}

#[derive(Serialize)]
struct KeyMaterial<'a> {
    symbols: Vec<&'a str>,
    filters: Vec<FilterId>,
    options: &'a ScreenOptions,
}

/// Order-insensitive key for one screener request.
pub fn cache_key(symbols: &[String], filters: &[FilterId], options: &ScreenOptions) -> String {
    let mut symbols: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();
    symbols.sort_unstable();
    symbols.dedup();
    let mut filters = filters.to_vec();
    filters.sort_unstable();
    filters.dedup();

    let material = KeyMaterial {
        symbols,
        filters,
        options,
    };
    // Serializing plain strings, enums and numbers cannot fail.
    let json = serde_json::to_vec(&material).unwrap_or_default();
    blake3::hash(&json).to_hex().to_string()
}

struct Entry {
    stored_at: Instant,
    rows: Vec<ScreenRow>,
}

/// In-memory TTL cache guarded by a mutex.
pub struct TtlCache {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.lock().retain(|_, e| e.stored_at.elapsed() < ttl);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResultCache for TtlCache {
    fn get(&self, key: &str) -> Option<Vec<ScreenRow>> {
        let mut entries = self.lock();
        let fresh = entries.get(key)?.stored_at.elapsed() < self.ttl;
        if fresh {
            entries.get(key).map(|e| e.rows.clone())
        } else {
            entries.remove(key);
            None
        }
    }

    /// Store `rows`, dropping every expired entry under the same lock.
    fn set(&self, key: &str, rows: Vec<ScreenRow>) {
        let ttl = self.ttl;
        let mut entries = self.lock();
        entries.retain(|_, e| e.stored_at.elapsed() < ttl);
        entries.insert(
            key.to_string(),
            Entry {
                stored_at: Instant::now(),
                rows,
            },
        );
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(symbol: &str) -> ScreenRow {
        ScreenRow {
            symbol: symbol.to_string(),
            price: 10.0,
            signals: Vec::new(),
            confidence: 0.8,
            direction: None,
        }
    }

    fn syms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn key_ignores_order_and_duplicates() {
        let opts = ScreenOptions::default();
        let a = cache_key(
            &syms(&["AAPL", "MSFT"]),
            &[FilterId::RsiOversold, FilterId::MacdBullish],
            &opts,
        );
        let b = cache_key(
            &syms(&["MSFT", "AAPL", "AAPL"]),
            &[FilterId::MacdBullish, FilterId::RsiOversold],
            &opts,
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn key_depends_on_options() {
        let symbols = syms(&["AAPL"]);
        let filters = [FilterId::RsiOversold];
        let loose = ScreenOptions::default();
        let strict = ScreenOptions {
            require_two_plus: true,
            ..ScreenOptions::default()
        };
        assert_ne!(
            cache_key(&symbols, &filters, &loose),
            cache_key(&symbols, &filters, &strict)
        );
    }

    #[test]
    fn get_returns_fresh_entries() {
        let cache = TtlCache::default();
        assert_eq!(cache.ttl(), DEFAULT_TTL);
        assert!(cache.get("k").is_none());
        cache.set("k", vec![row("AAPL")]);
        assert_eq!(cache.get("k").unwrap()[0].symbol, "AAPL");
    }

    #[test]
    fn expired_entries_are_evicted() {
        let cache = TtlCache::new(Duration::from_millis(10));
        cache.set("k", vec![row("AAPL")]);
        cache.set("j", vec![row("MSFT")]);
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 1);
        cache.purge_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn set_drops_expired_entries_for_other_keys() {
        let cache = TtlCache::new(Duration::from_millis(5));
        for i in 0..500 {
            cache.set(&format!("k{i}"), vec![row("AAPL")]);
        }
        std::thread::sleep(Duration::from_millis(20));
        cache.set("fresh", vec![row("MSFT")]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh").unwrap()[0].symbol, "MSFT");
    }
}
