use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// In-memory map whose entries expire after a time-to-live.
///
/// Clones share the same storage. Reads of an expired entry count as a miss
/// and drop the entry; `purge_expired` clears the rest in bulk.
pub struct TtlCache<V> {
    inner: Arc<Mutex<Inner<V>>>,
    default_ttl: Duration,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            default_ttl: self.default_ttl,
        }
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
            })),
            default_ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        // a panic while holding the lock leaves plain data behind, keep going
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();
        let now = Instant::now();

        let live = match inner.entries.get(key) {
            Some(e) if e.expires_at > now => Some(e.value.clone()),
            Some(_) => {
                inner.entries.remove(key);
                None
            }
            None => None,
        };

        if live.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        live
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    pub fn insert_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.lock().entries.insert(key.into(), entry);
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.lock().entries.remove(key).map(|e| e.value)
    }

    /// Drops every key starting with `prefix`, returns how many went.
    pub fn remove_prefix(&self, prefix: &str) -> usize {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|k, _| !k.starts_with(prefix));
        before - inner.entries.len()
    }

    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let n = inner.entries.len();
        inner.entries.clear();
        n
    }

    pub fn purge_expired(&self) -> usize {
        let mut inner = self.lock();
        let now = Instant::now();
        let before = inner.entries.len();
        inner.entries.retain(|_, e| e.expires_at > now);
        before - inner.entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entries: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_fresh_entries_and_counts() {
        let cache: TtlCache<i32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1);

        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn expired_entries_are_misses() {
        let cache: TtlCache<&str> = TtlCache::new(Duration::from_secs(60));
        cache.insert_with_ttl("k", "v", Duration::ZERO);

        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_only_drops_expired() {
        let cache: TtlCache<u8> = TtlCache::new(Duration::from_secs(60));
        cache.insert("keep", 1);
        cache.insert_with_ttl("drop", 2, Duration::ZERO);

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn remove_prefix_scopes_to_symbol() {
        let cache: TtlCache<u8> = TtlCache::new(Duration::from_secs(60));
        cache.insert("chart:AAPL:1min:100", 1);
        cache.insert("chart:AAPL:5min:100", 2);
        cache.insert("chart:MSFT:1min:100", 3);

        assert_eq!(cache.remove_prefix("chart:AAPL:"), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clones_share_storage() {
        let a: TtlCache<u8> = TtlCache::new(Duration::from_secs(60));
        let b = a.clone();
        a.insert("x", 9);
        assert_eq!(b.get("x"), Some(9));
    }
}
