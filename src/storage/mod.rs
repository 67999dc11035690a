// Storage abstraction layer
//
// This module defines the session trait that allows pluggable backends.

pub mod memory;
pub mod postgres_backend;

use crate::error::Result;

/// A live session against the durable backend
///
/// A session is owned exclusively by one borrower at a time (methods take
/// `&mut self`); the connection pool enforces that discipline. Implementors
/// translate the three logical operations into whatever statements the
/// backend speaks.
pub trait KvBackend: Send {
    /// Insert a key-value pair, replacing the value if the key exists
    fn upsert(&mut self, key: &str, value: &str) -> Result<()>;

    /// Fetch the value for a key
    ///
    /// The result is tri-state: `Ok(Some(value))`, `Ok(None)` for an absent
    /// key, and `Err` for a failed round-trip.
    fn fetch(&mut self, key: &str) -> Result<Option<String>>;

    /// Delete a key; deleting an absent key succeeds
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Cheap liveness probe, run by the pool before handing the session out
    fn ping(&mut self) -> bool;

    /// Re-establish the underlying connection after a failed probe
    fn reset(&mut self) -> Result<()>;
}
