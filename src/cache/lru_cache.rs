// LRU cache implementation
//
// Provides a least-recently-used eviction policy for the cache layer.

use crate::cache::CacheSnapshot;
use lru::LruCache;
use parking_lot::Mutex;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// Thread-safe bounded LRU cache
///
/// A single mutex guards both the recency list and the key index, so every
/// operation is atomic from any observer's perspective. The mutex is held
/// only for in-memory work; nothing under it performs I/O.
pub struct LruMemoryCache<K, V> {
    cache: Mutex<LruCache<K, V>>,
    capacity: usize,
}

impl<K, V> LruMemoryCache<K, V>
where
    K: Hash + Eq,
{
    /// Create a new LRU cache with the given capacity
    ///
    /// A capacity of `0` is legal and yields a cache that stores nothing:
    /// every insert is conceptually installed and immediately evicted.
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).expect("capacity >= 1");
        Self {
            cache: Mutex::new(LruCache::new(cap)),
            capacity,
        }
    }

    /// Number of resident entries
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// True when no entries are resident
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of resident entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove all entries, leaving the capacity unchanged
    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

impl<K, V> LruMemoryCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Insert or replace a value, promoting the key to most-recently-used
    ///
    /// If the key is absent and the cache is full, the least-recently-used
    /// entry is evicted first.
    pub fn insert(&self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        self.cache.lock().put(key, value);
    }

    /// Look up a value, promoting the key to most-recently-used on a hit
    pub fn get(&self, key: &K) -> Option<V> {
        // lru's get() takes &mut to update recency, hence the lock even on reads
        self.cache.lock().get(key).cloned()
    }

    /// Look up a value without updating recency
    pub fn peek(&self, key: &K) -> Option<V> {
        self.cache.lock().peek(key).cloned()
    }

    /// Remove a key if present; removing a missing key is a no-op
    pub fn invalidate(&self, key: &K) -> Option<V> {
        self.cache.lock().pop(key)
    }

    /// Copy out the current state under the lock
    ///
    /// Entries are ordered from most- to least-recently used.
    pub fn snapshot(&self) -> CacheSnapshot<K, V> {
        let cache = self.cache.lock();
        CacheSnapshot {
            len: cache.len(),
            capacity: self.capacity,
            entries: cache
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}
