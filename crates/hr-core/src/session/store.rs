//! In-memory session store
//!
//! Keyed by the transport-assigned session id. Entries are sharded via
//! `DashMap` so unrelated sessions never contend on one lock, and each
//! session id additionally owns an exchange lock that the router holds
//! for the whole get/mutate/put cycle of one exchange. That serializes
//! duplicate carrier deliveries for the same session without blocking
//! any other caller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::session::Session;

/// Shared in-memory session store
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionStore {
    /// Create a new empty session store
    pub fn new() -> Self {
        Self::default()
    }

    /// The per-session-id exchange lock
    ///
    /// Callers lock this before `get_or_create` and release it after
    /// `put`/`delete` so a retried request for the same session id can
    /// never interleave with the original.
    pub fn exchange_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// Return the stored session, or a fresh one for a lookup miss.
    ///
    /// A fresh session is not persisted here; the router persists after
    /// mutation so each exchange is a single atomic replace.
    pub fn get_or_create(&self, session_id: &str, caller: &str) -> Session {
        if let Some(session) = self.sessions.get(session_id) {
            return session.clone();
        }
        debug!(session_id, caller, "Creating new session");
        Session::new(caller)
    }

    /// Replace the stored session
    pub fn put(&self, session_id: &str, session: Session) {
        self.sessions.insert(session_id.to_string(), session);
    }

    /// Remove a session
    pub fn delete(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove sessions idle longer than `max_idle`; returns the count
    /// removed. Safe to run alongside live traffic: `retain` takes one
    /// shard at a time, never the whole map, and removals are counted
    /// inside the closure so concurrent inserts cannot skew the total.
    pub fn sweep(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let removed = AtomicUsize::new(0);
        self.sessions.retain(|_, session| {
            let keep = session.last_activity >= cutoff;
            if !keep {
                removed.fetch_add(1, Ordering::Relaxed);
            }
            keep
        });

        // Drop exchange locks with no surviving session. A strong count
        // above one means an exchange is mid-flight for that id (session
        // created but not yet put); its lock must survive so a duplicate
        // request still serializes against it.
        self.locks.retain(|id, lock| {
            Arc::strong_count(lock) > 1 || self.sessions.contains_key(id)
        });

        removed.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Stage;

    #[test]
    fn test_miss_creates_fresh_session() {
        let store = SessionStore::new();
        let session = store.get_or_create("sid-1", "+254711000111");
        assert_eq!(session.stage, Stage::Auth);
        // Not persisted until put
        assert!(!store.contains("sid-1"));
    }

    #[test]
    fn test_put_and_get() {
        let store = SessionStore::new();
        let mut session = store.get_or_create("sid-1", "+254711000111");
        session.transition(Stage::MainMenu);
        store.put("sid-1", session);

        let loaded = store.get_or_create("sid-1", "+254711000111");
        assert_eq!(loaded.stage, Stage::MainMenu);
    }

    #[test]
    fn test_delete() {
        let store = SessionStore::new();
        store.put("sid-1", Session::new("+254711000111"));
        store.delete("sid-1");
        assert!(!store.contains("sid-1"));
    }

    #[test]
    fn test_sweep_removes_only_idle_sessions() {
        let store = SessionStore::new();

        let mut idle = Session::new("+254711000111");
        idle.last_activity = Utc::now() - Duration::hours(2);
        store.put("idle", idle);
        store.put("active", Session::new("+254722000222"));

        let removed = store.sweep(Duration::hours(1));
        assert_eq!(removed, 1);
        assert!(!store.contains("idle"));
        assert!(store.contains("active"));
    }

    #[test]
    fn test_sweep_drops_orphaned_locks() {
        let store = SessionStore::new();
        let lock = store.exchange_lock("gone");
        drop(lock);
        assert_eq!(store.sweep(Duration::hours(1)), 0);
        assert!(store.locks.get("gone").is_none());
    }

    #[test]
    fn test_sweep_keeps_lock_held_by_inflight_exchange() {
        let store = SessionStore::new();

        // First exchange for a new id: lock taken, session not yet put
        let lock = store.exchange_lock("inflight");
        store.sweep(Duration::hours(1));

        // A duplicate request must still serialize on the same lock
        assert!(Arc::ptr_eq(&lock, &store.exchange_lock("inflight")));

        drop(lock);
        store.sweep(Duration::hours(1));
        assert!(store.locks.get("inflight").is_none());
    }

    #[test]
    fn test_sweep_counts_correctly_under_concurrent_inserts() {
        let store = Arc::new(SessionStore::new());

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..500 {
                    store.put(&format!("live-{}", i), Session::new("+254711000111"));
                }
            })
        };

        for _ in 0..200 {
            let mut idle = Session::new("+254722000222");
            idle.last_activity = Utc::now() - Duration::hours(2);
            store.put("idle", idle);
            assert_eq!(store.sweep(Duration::hours(1)), 1);
        }

        writer.join().unwrap();
        assert_eq!(store.len(), 500);
    }

    #[test]
    fn test_exchange_lock_is_shared_per_id() {
        let store = SessionStore::new();
        let a = store.exchange_lock("sid-1");
        let b = store.exchange_lock("sid-1");
        assert!(Arc::ptr_eq(&a, &b));
    }
}
