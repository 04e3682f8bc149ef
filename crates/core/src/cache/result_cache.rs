//! In-memory TTL cache with hit/miss accounting.

use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Default time to live for entries stored with [`ResultCache::set_default`].
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    /// `None` when the TTL is too large to represent.
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(at) => now < at,
            None => true,
        }
    }
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Stored entries, expired ones included until swept or read
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    /// Percentage, two decimals
    pub hit_rate: f64,
    pub total_requests: u64,
}

/// Key/value cache where every entry carries its own expiry.
///
/// Expired entries are dropped when read or on [`ResultCache::sweep`].
/// A single mutex guards the map and the counters; values are cloned out.
pub struct ResultCache<V> {
    state: Mutex<CacheState<V>>,
    default_ttl: Duration,
}

impl<V: Clone> ResultCache<V> {
    pub fn new() -> Self {
        Self::with_default_ttl(DEFAULT_CACHE_TTL)
    }

    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
            }),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<V>> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Result cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Live value for `key`. An expired entry is removed and counts as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut state = self.lock();

        let live = match state.entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                state.entries.remove(key);
                debug!("Cache entry '{}' expired", key);
                None
            }
            None => None,
        };

        if live.is_some() {
            state.hits += 1;
        } else {
            state.misses += 1;
        }
        live
    }

    /// Insert or overwrite `key`, expiring `ttl` from now.
    ///
    /// A TTL past the clock's range keeps the entry until it is deleted.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now().checked_add(ttl),
        };
        self.lock().entries.insert(key.into(), entry);
    }

    pub fn set_default(&self, key: impl Into<String>, value: V) {
        self.set(key, value, self.default_ttl);
    }

    /// Remove `key`. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        self.lock().entries.remove(key).is_some()
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.hits = 0;
        state.misses = 0;
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut state = self.lock();
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.is_live(now));
        before - state.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let total_requests = state.hits + state.misses;
        let hit_rate = if total_requests > 0 {
            (state.hits as f64 / total_requests as f64 * 10_000.0).round() / 100.0
        } else {
            0.0
        };
        CacheStats {
            size: state.entries.len(),
            hits: state.hits,
            misses: state.misses,
            hit_rate,
            total_requests,
        }
    }

    /// Return the cached value for `key`, or compute, store and return it.
    ///
    /// The computation runs without holding the lock, so concurrent misses on
    /// the same key may both compute. Errors are returned and not cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = compute().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_entry_expires_and_counts_one_miss() {
        let cache: ResultCache<Value> = ResultCache::new();
        cache.set("AAA", json!({"p": 1}), Duration::from_secs(1));

        assert_eq!(cache.get("AAA"), Some(json!({"p": 1})));
        let misses_before = cache.stats().misses;

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(cache.get("AAA"), None);
        let stats = cache.stats();
        assert_eq!(stats.misses, misses_before + 1);
        // Evicted in place
        assert_eq!(stats.size, 0);
    }

    #[test]
    fn test_hits_plus_misses_equals_lookups() {
        let cache: ResultCache<i32> = ResultCache::new();
        cache.set_default("a", 1);

        cache.get("a");
        cache.get("a");
        cache.get("b");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.hit_rate, 66.67);
    }

    #[test]
    fn test_clear_resets_counters() {
        let cache: ResultCache<i32> = ResultCache::new();
        cache.set_default("a", 1);
        cache.get("a");
        cache.get("missing");

        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_set_overwrites_and_delete() {
        let cache: ResultCache<&'static str> = ResultCache::new();
        cache.set_default("k", "old");
        cache.set_default("k", "new");
        assert_eq!(cache.get("k"), Some("new"));

        assert!(cache.delete("k"));
        assert!(!cache.delete("k"));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let cache: ResultCache<i32> = ResultCache::new();
        cache.set("short", 1, Duration::from_millis(10));
        cache.set("long", 2, Duration::from_secs(60));

        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.stats().size, 1);
        assert_eq!(cache.get("long"), Some(2));
        // Sweeping does not touch the counters
        assert_eq!(cache.stats().total_requests, 1);
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        let cache: ResultCache<i32> = ResultCache::new();
        cache.set("forever", 1, Duration::from_secs(u64::MAX));
        cache.set("max", 2, Duration::MAX);

        assert_eq!(cache.get("forever"), Some(1));
        assert_eq!(cache.get("max"), Some(2));
        assert_eq!(cache.sweep(), 0);
        assert_eq!(cache.stats().size, 2);
    }

    #[test]
    fn test_zero_ttl_is_never_readable() {
        let cache: ResultCache<i32> = ResultCache::new();
        cache.set("k", 1, Duration::ZERO);
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test]
    async fn test_get_or_try_insert_with_memoizes() {
        let cache: ResultCache<u32> = ResultCache::new();
        let mut calls = 0;

        let first: Result<u32, String> = cache
            .get_or_try_insert_with("sq", Duration::from_secs(60), || {
                calls += 1;
                async { Ok(49) }
            })
            .await;
        assert_eq!(first, Ok(49));

        let second: Result<u32, String> = cache
            .get_or_try_insert_with("sq", Duration::from_secs(60), || async {
                Err("should not run".to_string())
            })
            .await;
        assert_eq!(second, Ok(49));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_get_or_try_insert_with_does_not_cache_errors() {
        let cache: ResultCache<u32> = ResultCache::new();

        let failed: Result<u32, String> = cache
            .get_or_try_insert_with("k", Duration::from_secs(60), || async {
                Err("upstream down".to_string())
            })
            .await;
        assert!(failed.is_err());
        assert_eq!(cache.stats().size, 0);
    }
}
