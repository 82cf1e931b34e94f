//! Bounded in-memory caches.
//!
//! Two flavours, both explicitly owned (no globals) and wrapped in a
//! `parking_lot::Mutex` by whoever shares them:
//!
//! - [`TtlCache`]: time-bounded cache for expensive upstream payloads.
//!   Entries expire lazily on read; when the map grows past its capacity
//!   the single oldest entry (by store time) is evicted.
//! - [`LruMap`]: capacity-bounded memoization map for per-identifier
//!   lookups that are stable for the process lifetime. Reads refresh
//!   recency; inserting past capacity evicts the least recently used key.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

struct TtlEntry<V> {
    stored_at: Instant,
    value: V,
}

/// Time-to-live cache with oldest-first eviction past a capacity cap.
pub struct TtlCache<K, V> {
    ttl: Duration,
    capacity: usize,
    entries: HashMap<K, TtlEntry<V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    /// Create a cache holding entries for `ttl`, evicting past `capacity`.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: HashMap::new(),
        }
    }

    /// Return a live entry, removing it first if it has outlived the TTL.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.stored_at.elapsed() >= self.ttl,
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Store a value, evicting the oldest entry if the cap is now exceeded.
    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(
            key,
            TtlEntry {
                stored_at: Instant::now(),
                value,
            },
        );
        if self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                self.entries.remove(&key);
            }
        }
    }

    /// Number of stored entries (live or not yet read past expiry).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct LruEntry<V> {
    stamp: u64,
    value: V,
}

/// Least-recently-used memoization map with a hard capacity.
///
/// Recency is tracked with a monotonic stamp; eviction scans for the
/// minimum stamp. Capacities here are small (hundreds), so the linear
/// scan stays cheap and avoids a linked-list dependency.
pub struct LruMap<K, V> {
    capacity: usize,
    clock: u64,
    entries: HashMap<K, LruEntry<V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> LruMap<K, V> {
    /// Create a map that never holds more than `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            clock: 0,
            entries: HashMap::new(),
        }
    }

    /// Look up a key, refreshing its recency on hit.
    pub fn get(&mut self, key: &K) -> Option<V> {
        self.clock += 1;
        let clock = self.clock;
        self.entries.get_mut(key).map(|entry| {
            entry.stamp = clock;
            entry.value.clone()
        })
    }

    /// Insert a value, evicting the least recently used entry if needed.
    pub fn insert(&mut self, key: K, value: V) {
        self.clock += 1;
        self.entries.insert(
            key,
            LruEntry {
                stamp: self.clock,
                value,
            },
        );
        if self.entries.len() > self.capacity {
            let coldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.stamp)
                .map(|(key, _)| key.clone());
            if let Some(key) = coldest {
                self.entries.remove(&key);
            }
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ttl_cache_hit_within_ttl() {
        let mut cache = TtlCache::new(Duration::from_secs(60), 8);
        cache.insert("key", "value");
        assert_eq!(cache.get(&"key"), Some("value"));
    }

    #[test]
    fn test_ttl_cache_expires_on_read() {
        let mut cache = TtlCache::new(Duration::ZERO, 8);
        cache.insert("key", "value");
        // Zero TTL: the entry is already stale by the time we read it.
        assert_eq!(cache.get(&"key"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_ttl_cache_evicts_oldest_past_cap() {
        let mut cache = TtlCache::new(Duration::from_secs(60), 2);
        cache.insert("a", 1);
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("b", 2);
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("c", 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), None, "oldest entry should be evicted");
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn test_lru_map_basic() {
        let mut map = LruMap::new(4);
        map.insert("a", 1);
        assert_eq!(map.get(&"a"), Some(1));
        assert_eq!(map.get(&"missing"), None);
    }

    #[test]
    fn test_lru_map_evicts_least_recent() {
        let mut map = LruMap::new(2);
        map.insert("a", 1);
        map.insert("b", 2);
        // Touch "a" so "b" becomes the eviction candidate.
        assert_eq!(map.get(&"a"), Some(1));
        map.insert("c", 3);

        assert_eq!(map.get(&"b"), None);
        assert_eq!(map.get(&"a"), Some(1));
        assert_eq!(map.get(&"c"), Some(3));
    }

    proptest! {
        #[test]
        fn prop_lru_never_exceeds_capacity(
            capacity in 1usize..16,
            keys in proptest::collection::vec(0u16..64, 0..256),
        ) {
            let mut map = LruMap::new(capacity);
            for key in keys {
                map.insert(key, key);
                prop_assert!(map.len() <= capacity);
            }
        }

        #[test]
        fn prop_ttl_cache_never_exceeds_capacity(
            capacity in 1usize..16,
            keys in proptest::collection::vec(0u16..64, 0..256),
        ) {
            let mut cache = TtlCache::new(Duration::from_secs(60), capacity);
            for key in keys {
                cache.insert(key, key);
                prop_assert!(cache.len() <= capacity);
            }
        }
    }
}
