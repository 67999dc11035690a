// HotKV
//
// A read-through, write-through key-value store exposed over HTTP.
//
// Requests are persisted in PostgreSQL and accelerated through a bounded
// in-memory LRU cache:
// - **LRU Cache**: O(1) lookup, promotion, and eviction with consistent snapshots
// - **Connection Pool**: fixed set of blocking backend sessions with
//   condvar wait discipline and liveness-checked reuse
// - **Coordinator**: backend-first sequencing so the cache never advertises
//   a value that was not durably written
// - **HTTP Dispatcher**: create / read / delete plus a cache status page
//
// Quick Start
//
// ```rust,no_run
// use std::sync::Arc;
// use hotkv::storage::postgres_backend::PostgresSession;
// use hotkv::{Config, ConnectionPool, KvStore, Result};
//
// # fn main() -> Result<()> {
// let config = Config::default().with_cache_capacity(100).with_pool_size(4);
//
// let pool = ConnectionPool::establish(config.pool_size, || {
//     PostgresSession::connect(&config)
// });
// assert!(pool.is_connected());
//
// let store = KvStore::new(Arc::new(pool), config.cache_capacity);
// store.put("greeting", "hello")?;
// let value = store.get("greeting")?;
// # Ok(())
// # }
// ```

// Re-export main types
pub use cache::CacheSnapshot;
pub use config::Config;
pub use error::{Error, Result};
pub use kv::{KvStore, ValueSource};
pub use pool::{ConnectionPool, PooledSession};
pub use storage::KvBackend;

// Core modules
pub mod config;
pub mod error;
pub mod kv;
pub mod server;

// Building blocks (public so the store can be embedded without the HTTP surface)
pub mod cache;
pub mod pool;
pub mod storage;
