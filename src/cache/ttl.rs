//! In-memory TTL cache with lazy eviction
//!
//! Entries carry their own expiry instant. An expired entry is a miss and is
//! dropped on the access that finds it; there is no background sweeper.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// A cached value and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// String-keyed cache whose entries expire after a per-entry TTL.
///
/// Values are cloned out on read and replaced whole on write; callers never
/// hold a reference into the map.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a live value, evicting the entry if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_entry(key).map(|entry| entry.value)
    }

    /// Get a live entry together with its expiry.
    pub fn get_entry(&self, key: &str) -> Option<CacheEntry<V>> {
        let now = Instant::now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.clone()),
            None => None,
        }
    }

    /// Store a value, replacing any previous entry for the key.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.lock().insert(key.into(), entry);
    }

    /// Remove a single key. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Remove `key` only if its current value satisfies `predicate`.
    ///
    /// The check and the removal happen under one lock, so a value stored
    /// concurrently under the same key is never removed by mistake.
    pub fn delete_if<P>(&self, key: &str, predicate: P) -> bool
    where
        P: FnOnce(&V) -> bool,
    {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if predicate(&entry.value) => {
                entries.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Remove every entry whose key matches the predicate.
    pub fn delete_matching<P>(&self, predicate: P) -> usize
    where
        P: Fn(&str) -> bool,
    {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !predicate(key));
        before - entries.len()
    }

    /// Remove everything, returning how many entries were dropped.
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Number of stored entries, including ones not yet lazily evicted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of live keys with the time each has left.
    pub fn live_entries(&self) -> Vec<(String, Duration)> {
        let now = Instant::now();
        let mut live: Vec<_> = self
            .lock()
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, entry)| (key.clone(), entry.expires_at - now))
            .collect();
        live.sort();
        live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_get_returns_value_before_expiry() {
        let cache = TtlCache::new();
        cache.set("a", 1, Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(cache.get("a"), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_miss_and_evicted() {
        let cache = TtlCache::new();
        cache.set("a", 1, Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_replaces_entry_and_expiry() {
        let cache = TtlCache::new();
        cache.set("a", 1, Duration::from_secs(5));
        tokio::time::advance(Duration::from_secs(4)).await;
        cache.set("a", 2, Duration::from_secs(5));
        tokio::time::advance(Duration::from_secs(4)).await;

        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn test_delete_matching_by_substring() {
        let cache = TtlCache::new();
        cache.set("host-a:443:admin", 1, Duration::from_secs(60));
        cache.set("GET https://host-a/api", 2, Duration::from_secs(60));
        cache.set("host-b:443:admin", 3, Duration::from_secs(60));

        let removed = cache.delete_matching(|key| key.contains("host-a"));
        assert_eq!(removed, 2);
        assert_eq!(cache.get("host-b:443:admin"), Some(3));
    }

    #[test]
    fn test_clear_returns_count() {
        let cache = TtlCache::new();
        cache.set("a", 1, Duration::from_secs(60));
        cache.set("b", 2, Duration::from_secs(60));

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_delete_if_checks_current_value() {
        let cache = TtlCache::new();
        cache.set("a", 2, Duration::from_secs(60));

        assert!(!cache.delete_if("a", |v| *v == 1));
        assert_eq!(cache.get("a"), Some(2));
        assert!(cache.delete_if("a", |v| *v == 2));
        assert!(!cache.delete_if("a", |_| true));
    }

    #[test]
    fn test_delete_single_key() {
        let cache = TtlCache::new();
        cache.set("a", 1, Duration::from_secs(60));

        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
    }
}
