// In-memory cache layer
//
// This module provides the bounded LRU cache that fronts the durable
// backend. Reads promote, writes install at the MRU position, and the
// coldest entry is evicted once the capacity is reached.

pub mod lru_cache;

/// Point-in-time copy of cache state
///
/// A snapshot is a value, not a reference: it can be inspected without
/// further coordination with the live cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSnapshot<K, V> {
    /// Number of resident entries at the time of the snapshot
    pub len: usize,

    /// Maximum number of resident entries
    pub capacity: usize,

    /// Entries ordered from most- to least-recently used
    pub entries: Vec<(K, V)>,
}

impl<K, V> CacheSnapshot<K, V> {
    /// True when the cache held no entries at the time of the snapshot
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
