// Blocking connection pool for backend sessions
//
// A fixed set of sessions is established at startup and recycled for the
// process lifetime. Borrowers block on a condition variable until a session
// is idle; every release wakes exactly one waiter. A borrowed session is
// owned exclusively through a scoped handle that returns it on any exit
// path, including unwinds, and can be explicitly invalidated when the
// borrower observes corruption.

use crate::error::{Error, Result};
use crate::storage::KvBackend;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};
use tracing::{info, warn};

struct PoolState<S> {
    idle: VecDeque<S>,
    established: usize,
    failed: usize,
}

/// Fixed-capacity pool of reusable backend sessions
///
/// The idle queue is guarded by one mutex paired with a condition variable
/// for blocked acquirers. Sessions themselves are never shared: whoever
/// holds the [`PooledSession`] handle is the sole user.
pub struct ConnectionPool<S: KvBackend> {
    state: Mutex<PoolState<S>>,
    available: Condvar,
}

impl<S: KvBackend> ConnectionPool<S> {
    /// Establish up to `size` sessions, retaining the successful ones
    ///
    /// Failed attempts are logged and skipped; the pool is usable iff at
    /// least one session was established. Callers must check
    /// [`is_connected`](Self::is_connected) before serving traffic.
    pub fn establish<F>(size: usize, mut connect: F) -> Self
    where
        F: FnMut() -> Result<S>,
    {
        let mut idle = VecDeque::with_capacity(size);
        for slot in 0..size {
            match connect() {
                Ok(session) => idle.push_back(session),
                Err(err) => warn!("failed to establish session {slot}: {err}"),
            }
        }
        let established = idle.len();
        info!("connection pool ready: {established}/{size} sessions established");

        Self {
            state: Mutex::new(PoolState {
                idle,
                established,
                failed: 0,
            }),
            available: Condvar::new(),
        }
    }

    /// Borrow a session, blocking until one is idle
    ///
    /// If the chosen session fails its liveness probe, one repair is
    /// attempted; the session is handed out either way and the next
    /// operation surfaces any remaining failure.
    pub fn acquire(&self) -> PooledSession<'_, S> {
        let mut session = {
            let mut state = self.state.lock();
            loop {
                if let Some(session) = state.idle.pop_front() {
                    break session;
                }
                self.available.wait(&mut state);
            }
        };
        self.repair_if_dead(&mut session);
        PooledSession {
            pool: self,
            session: Some(session),
            poisoned: false,
        }
    }

    /// Borrow a session, giving up after `timeout`
    ///
    /// Returns [`Error::PoolTimeout`] if no session became idle in time.
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<PooledSession<'_, S>> {
        let deadline = Instant::now() + timeout;
        let mut session = {
            let mut state = self.state.lock();
            loop {
                if let Some(session) = state.idle.pop_front() {
                    break session;
                }
                if self.available.wait_until(&mut state, deadline).timed_out() {
                    match state.idle.pop_front() {
                        Some(session) => break session,
                        None => return Err(Error::PoolTimeout),
                    }
                }
            }
        };
        self.repair_if_dead(&mut session);
        Ok(PooledSession {
            pool: self,
            session: Some(session),
            poisoned: false,
        })
    }

    /// True iff at least one session was established at construction
    pub fn is_connected(&self) -> bool {
        self.state.lock().established > 0
    }

    /// Sessions established at construction time
    pub fn established(&self) -> usize {
        self.state.lock().established
    }

    /// Sessions currently idle in the pool
    pub fn idle_count(&self) -> usize {
        self.state.lock().idle.len()
    }

    /// Sessions permanently removed after explicit invalidation
    pub fn failed_count(&self) -> usize {
        self.state.lock().failed
    }

    fn repair_if_dead(&self, session: &mut S) {
        if !session.ping() {
            warn!("pooled session failed liveness probe, attempting repair");
            if let Err(err) = session.reset() {
                warn!("session repair failed: {err}");
            }
        }
    }

    fn release(&self, session: S) {
        let mut state = self.state.lock();
        state.idle.push_back(session);
        self.available.notify_one();
    }

    fn discard(&self) {
        let mut state = self.state.lock();
        state.failed += 1;
        warn!(
            "session permanently removed from pool ({} of {} remain)",
            state.established - state.failed,
            state.established
        );
    }
}

/// Scoped handle to a borrowed session
///
/// Dereferences to the session. On drop the session is returned to the pool
/// and one waiter is woken, unless the handle was invalidated, in which case
/// the session is dropped for good.
pub struct PooledSession<'a, S: KvBackend> {
    pool: &'a ConnectionPool<S>,
    session: Option<S>,
    poisoned: bool,
}

impl<S: KvBackend> PooledSession<'_, S> {
    /// Mark the session as unusable; it will not rejoin the pool
    pub fn invalidate(&mut self) {
        self.poisoned = true;
    }
}

impl<S: KvBackend> Deref for PooledSession<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.session.as_ref().expect("session present until drop")
    }
}

impl<S: KvBackend> DerefMut for PooledSession<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.session.as_mut().expect("session present until drop")
    }
}

impl<S: KvBackend> Drop for PooledSession<'_, S> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            if self.poisoned {
                drop(session);
                self.pool.discard();
            } else {
                self.pool.release(session);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryBackend;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pool_of(backend: &MemoryBackend, size: usize) -> ConnectionPool<MemoryBackend> {
        ConnectionPool::establish(size, || Ok(backend.clone()))
    }

    #[test]
    fn test_establish_counts_successes() {
        let backend = MemoryBackend::new();
        let attempts = AtomicUsize::new(0);
        let pool = ConnectionPool::establish(4, || {
            // Every other attempt fails
            if attempts.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                Ok(backend.clone())
            } else {
                Err(Error::Storage("connection refused".to_string()))
            }
        });

        assert!(pool.is_connected());
        assert_eq!(pool.established(), 2);
        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn test_establish_zero_sessions_not_connected() {
        let pool: ConnectionPool<MemoryBackend> =
            ConnectionPool::establish(3, || Err(Error::Storage("down".to_string())));
        assert!(!pool.is_connected());
        assert_eq!(pool.established(), 0);
    }

    #[test]
    fn test_acquire_and_drop_restores_idle() {
        let backend = MemoryBackend::new();
        let pool = pool_of(&backend, 2);

        {
            let mut session = pool.acquire();
            session.upsert("k", "v").unwrap();
            assert_eq!(pool.idle_count(), 1);
        }
        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn test_exclusive_ownership_via_timeout() {
        let backend = MemoryBackend::new();
        let pool = pool_of(&backend, 1);

        let _held = pool.acquire();
        let err = pool
            .acquire_timeout(Duration::from_millis(50))
            .err()
            .expect("second acquire must time out");
        assert!(matches!(err, Error::PoolTimeout));
    }

    #[test]
    fn test_release_wakes_blocked_acquirer() {
        let backend = MemoryBackend::new();
        let pool = Arc::new(pool_of(&backend, 1));

        let held = pool.acquire();
        let waiter = {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || {
                let session = pool
                    .acquire_timeout(Duration::from_secs(5))
                    .expect("waiter should be woken well before the deadline");
                drop(session);
            })
        };

        std::thread::sleep(Duration::from_millis(50));
        drop(held);
        waiter.join().expect("waiter panicked");
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn test_session_returned_on_unwind() {
        let backend = MemoryBackend::new();
        let pool = Arc::new(pool_of(&backend, 1));

        let result = {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || {
                let _session = pool.acquire();
                panic!("request handler died");
            })
            .join()
        };

        assert!(result.is_err());
        assert_eq!(pool.idle_count(), 1, "unwind must still release the session");
    }

    #[test]
    fn test_invalidate_removes_session_permanently() {
        let backend = MemoryBackend::new();
        let pool = pool_of(&backend, 2);

        {
            let mut session = pool.acquire();
            session.invalidate();
        }
        assert_eq!(pool.idle_count(), 1);
        assert_eq!(pool.failed_count(), 1);
        assert_eq!(pool.established(), 2);

        // The remaining session still serves
        let mut session = pool.acquire();
        session.upsert("k", "v").unwrap();
    }

    #[test]
    fn test_repair_attempted_on_dead_session() {
        let backend = MemoryBackend::new();
        let pool = pool_of(&backend, 1);

        backend.set_healthy(false);
        let mut session = pool.acquire();
        assert_eq!(backend.reset_count(), 1, "acquire must attempt one repair");
        assert!(session.ping(), "repair restored the session");
        session.upsert("k", "v").unwrap();
    }

    #[test]
    fn test_conservation_under_concurrent_load() {
        let backend = MemoryBackend::new();
        let pool = Arc::new(pool_of(&backend, 3));

        let handles: Vec<_> = (0_u32..8)
            .map(|t| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for i in 0_u32..50 {
                        let key = format!("t{t}_{i}");
                        let mut session = pool.acquire();
                        session.upsert(&key, "v").unwrap();
                        assert_eq!(session.fetch(&key).unwrap(), Some("v".to_string()));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("pool worker panicked");
        }
        assert_eq!(pool.idle_count(), 3, "all sessions back at quiescence");
        assert_eq!(pool.failed_count(), 0);
    }
}
