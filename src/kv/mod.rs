// Key-Value store API
//
// The coordinator sequences cache and backend operations: reads consult the
// cache first and fill it from the backend on a miss; writes and deletes hit
// the backend first and only touch the cache once the backend has committed.
// The cache therefore never advertises a value that was not durably written.

use crate::cache::CacheSnapshot;
use crate::cache::lru_cache::LruMemoryCache;
use crate::error::Result;
use crate::pool::ConnectionPool;
use crate::storage::KvBackend;
use std::sync::Arc;
use tracing::warn;

/// Where a successful read found its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Served from the in-memory cache
    Cache,
    /// Fetched from the durable backend
    Backend,
}

/// Key-Value store with read-through and write-through policies
pub struct KvStore<S: KvBackend> {
    pool: Arc<ConnectionPool<S>>,
    cache: Arc<LruMemoryCache<String, String>>,
}

impl<S: KvBackend> KvStore<S> {
    /// Create a new KV store over an established pool
    pub fn new(pool: Arc<ConnectionPool<S>>, cache_capacity: usize) -> Self {
        Self {
            pool,
            cache: Arc::new(LruMemoryCache::new(cache_capacity)),
        }
    }

    /// Get a value by key, reporting where it was found
    ///
    /// A backend read failure is collapsed to "absent": callers cannot act
    /// on the difference, and the next successful read or write repairs the
    /// cache. The underlying error is logged.
    pub fn get(&self, key: &str) -> Result<Option<(String, ValueSource)>> {
        // Check cache first
        if let Some(value) = self.cache.get(&key.to_string()) {
            return Ok(Some((value, ValueSource::Cache)));
        }

        // Cache miss - fetch from the backend on a pooled session
        let fetched = {
            let mut session = self.pool.acquire();
            session.fetch(key)
        };

        match fetched {
            Ok(Some(value)) => {
                self.cache.insert(key.to_string(), value.clone());
                Ok(Some((value, ValueSource::Backend)))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                warn!("backend read failed for key '{key}', treating as absent: {err}");
                Ok(None)
            }
        }
    }

    /// Put a key-value pair
    ///
    /// Write-through: the backend commits first; the cache is only updated
    /// on success. A failed write leaves the cache exactly as it was.
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        {
            let mut session = self.pool.acquire();
            session.upsert(key, value)?;
        }
        self.cache.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Delete a key
    ///
    /// The backend deletes first; the cache entry is only invalidated on
    /// success, so a failed delete cannot hide a still-durable value.
    pub fn delete(&self, key: &str) -> Result<()> {
        {
            let mut session = self.pool.acquire();
            session.remove(key)?;
        }
        self.cache.invalidate(&key.to_string());
        Ok(())
    }

    /// Point-in-time copy of the cache contents, MRU to LRU
    pub fn cache_snapshot(&self) -> CacheSnapshot<String, String> {
        self.cache.snapshot()
    }

    /// The pool serving this store
    pub fn pool(&self) -> &ConnectionPool<S> {
        &self.pool
    }
}
