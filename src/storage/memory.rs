// In-memory storage backend
//
// A `KvBackend` over a shared hash map. Cloning a session yields another
// session against the same map, mirroring several pooled connections to one
// database. Failure injection switches let tests exercise the write-through
// and repair paths without a live server.

use crate::error::{Error, Result};
use crate::storage::KvBackend;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory `KvBackend` session with failure injection
#[derive(Clone)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
    healthy: Arc<AtomicBool>,
    resets: Arc<AtomicUsize>,
}

impl MemoryBackend {
    /// Create a fresh backend; clone the result to open further sessions
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            fail_writes: Arc::new(AtomicBool::new(false)),
            fail_reads: Arc::new(AtomicBool::new(false)),
            healthy: Arc::new(AtomicBool::new(true)),
            resets: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make subsequent upserts and removes fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent fetches fail
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Control the liveness probe result
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Number of `reset` calls across all sessions
    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    /// Seed an entry directly, bypassing the write path
    pub fn preload(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl KvBackend for MemoryBackend {
    fn upsert(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage("injected write failure".to_string()));
        }
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn fetch(&mut self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Storage("injected read failure".to_string()));
        }
        Ok(self.entries.lock().get(key).cloned())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage("injected write failure".to_string()));
        }
        self.entries.lock().remove(key);
        Ok(())
    }

    fn ping(&mut self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    fn reset(&mut self) -> Result<()> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        self.healthy.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_sessions() {
        let backend = MemoryBackend::new();
        let mut session_a = backend.clone();
        let mut session_b = backend.clone();

        session_a.upsert("k", "v").unwrap();
        assert_eq!(session_b.fetch("k").unwrap(), Some("v".to_string()));

        session_b.remove("k").unwrap();
        assert_eq!(session_a.fetch("k").unwrap(), None);
    }

    #[test]
    fn test_write_failure_injection() {
        let backend = MemoryBackend::new();
        let mut session = backend.clone();

        backend.fail_writes(true);
        assert!(session.upsert("k", "v").is_err());
        assert!(session.remove("k").is_err());

        backend.fail_writes(false);
        session.upsert("k", "v").unwrap();
        assert_eq!(session.fetch("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_reset_restores_health() {
        let backend = MemoryBackend::new();
        let mut session = backend.clone();

        backend.set_healthy(false);
        assert!(!session.ping());

        session.reset().unwrap();
        assert!(session.ping());
        assert_eq!(backend.reset_count(), 1);
    }
}
