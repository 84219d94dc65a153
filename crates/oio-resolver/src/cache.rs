// Path: crates/oio-resolver/src/cache.rs
//! A single generic cache structure covering both TTL and cardinality
//! bounds. Both the `csm0` and `services` caches are instances of this one
//! type, each behind its own single mutex.

use lru::LruCache;
use parking_lot::Mutex;
use std::hash::Hash;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    ctime: i64,
    #[allow(dead_code)]
    atime: i64,
}

/// A TTL + max-cardinality bounded LRU cache.
/// Each entry carries `{value, atime, ctime}`; eviction on insert drops the
/// LRU entry once `len() > max` (unless the caller requests `NOMAX`), and
/// `expire(now)` drops entries whose `ctime` predates `now - ttl`.
pub struct TtlLruCache<K: Hash + Eq + Clone, V: Clone> {
    inner: Mutex<LruCache<K, CacheEntry<V>>>,
    ttl_secs: i64,
    max: usize,
}

impl<K: Hash + Eq + Clone, V: Clone> TtlLruCache<K, V> {
    pub fn new(ttl_secs: i64, max: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::unbounded()),
            ttl_secs,
            max,
        }
    }

    /// Looks up `key`. Lazily evicts the entry and returns `None` if it has
    /// expired. When `noatime` is set, the lookup does not promote the
    /// entry's LRU position.
    pub fn get(&self, key: &K, now: i64, noatime: bool) -> Option<V> {
        let mut guard = self.inner.lock();
        let expired = match guard.peek(key) {
            Some(entry) => now - entry.ctime > self.ttl_secs,
            None => return None,
        };
        if expired {
            guard.pop(key);
            return None;
        }
        if noatime {
            guard.peek(key).map(|e| e.value.clone())
        } else {
            guard.get_mut(key).map(|e| {
                    e.atime = now;
                    e.value.clone()
                })
        }
    }

    /// Inserts `value` for `key`. Unless `nomax` is set, evicts the LRU
    /// entry until `len() <= max`.
    pub fn insert(&self, key: K, value: V, now: i64, nomax: bool) {
        let mut guard = self.inner.lock();
        guard.put(
            key,
            CacheEntry {
                value,
                ctime: now,
                atime: now,
            },
        );
        if !nomax {
            while guard.len() > self.max {
                guard.pop_lru();
            }
        }
    }

    pub fn remove(&self, key: &K) {
        self.inner.lock().pop(key);
    }

    /// Drops every entry whose `ctime` predates `now - ttl`.
    pub fn expire(&self, now: i64) -> usize {
        let mut guard = self.inner.lock();
        let stale: Vec<K> = guard
        .iter()
        .filter(|(_, entry)| now - entry.ctime > self.ttl_secs)
        .map(|(k, _)| k.clone())
        .collect();
        let count = stale.len();
        for key in stale {
            guard.pop(&key);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_roundtrips() {
        let cache: TtlLruCache<String, i32> = TtlLruCache::new(60, 10);
        cache.insert("a".to_string(), 1, 0, false);
        assert_eq!(cache.get(&"a".to_string(), 5, false), Some(1));
    }

    #[test]
    fn get_returns_none_past_ttl() {
        let cache: TtlLruCache<String, i32> = TtlLruCache::new(10, 10);
        cache.insert("a".to_string(), 1, 0, false);
        assert_eq!(cache.get(&"a".to_string(), 11, false), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn insert_evicts_lru_past_max() {
        let cache: TtlLruCache<i32, i32> = TtlLruCache::new(600, 2);
        cache.insert(1, 1, 0, false);
        cache.insert(2, 2, 0, false);
        cache.insert(3, 3, 0, false);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&1, 0, false), None);
        assert_eq!(cache.get(&3, 0, false), Some(3));
    }

    #[test]
    fn nomax_bypasses_cardinality_cap() {
        let cache: TtlLruCache<i32, i32> = TtlLruCache::new(600, 1);
        cache.insert(1, 1, 0, false);
        cache.insert(2, 2, 0, true);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn noatime_does_not_change_eviction_order() {
        let cache: TtlLruCache<i32, i32> = TtlLruCache::new(600, 2);
        cache.insert(1, 1, 0, false);
        cache.insert(2, 2, 0, false);
        // touching 1 with noatime must not save it from LRU eviction
        cache.get(&1, 0, true);
        cache.insert(3, 3, 0, false);
        assert_eq!(cache.get(&1, 0, false), None);
    }

    #[test]
    fn expire_drops_only_stale_entries() {
        let cache: TtlLruCache<i32, i32> = TtlLruCache::new(10, 10);
        cache.insert(1, 1, 0, false);
        cache.insert(2, 2, 8, false);
        let removed = cache.expire(12);
        assert_eq!(removed, 1);
        assert_eq!(cache.get(&1, 12, true), None);
        assert_eq!(cache.get(&2, 12, true), Some(2));
    }
}
