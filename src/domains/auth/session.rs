//! Per-session Music User Token storage.
//!
//! The store keys user tokens by the opaque session id the transport
//! supplies. A single "pending" slot holds a token observed before any
//! session id was known; it is copied into a session-keyed record the first
//! time a session id shows up.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::Utc;

#[derive(Debug, Clone)]
struct UserTokenRecord {
    token: String,
    /// Absent means the record never expires on its own.
    expires_at: Option<i64>,
}

#[derive(Debug, Default)]
struct StoreInner {
    sessions: HashMap<String, UserTokenRecord>,
    pending: Option<String>,
}

/// In-memory store of user tokens, bounded by process lifetime.
///
/// Each operation is individually atomic; there is no cross-call
/// atomicity, so callers must not assume sequencing across requests.
#[derive(Debug, Default)]
pub struct UserTokenStore {
    inner: Mutex<StoreInner>,
}

impl UserTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the record for a session id unconditionally.
    ///
    /// With a ttl the record expires at `now + ttl`; without one it lives
    /// for the rest of the process.
    pub fn put(&self, session_id: &str, token: &str, ttl_secs: Option<i64>) {
        let expires_at = ttl_secs.map(|ttl| Utc::now().timestamp() + ttl);
        let mut inner = self.lock();
        inner.sessions.insert(
            session_id.to_string(),
            UserTokenRecord {
                token: token.to_string(),
                expires_at,
            },
        );
    }

    /// Look up the token bound to a session id.
    ///
    /// Expired records are evicted here, lazily; there is no sweep for
    /// this store.
    pub fn get(&self, session_id: &str) -> Option<String> {
        let mut inner = self.lock();
        let expired = match inner.sessions.get(session_id) {
            Some(record) => record
                .expires_at
                .is_some_and(|at| at <= Utc::now().timestamp()),
            None => return None,
        };
        if expired {
            inner.sessions.remove(session_id);
            return None;
        }
        inner.sessions.get(session_id).map(|r| r.token.clone())
    }

    /// Hold a token that arrived before any session id was observable.
    /// Last write wins.
    pub fn set_pending(&self, token: &str) {
        self.lock().pending = Some(token.to_string());
    }

    /// Read the pending token without consuming it.
    pub fn pending(&self) -> Option<String> {
        self.lock().pending.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get() {
        let store = UserTokenStore::new();
        store.put("s1", "tok-a", None);
        assert_eq!(store.get("s1").as_deref(), Some("tok-a"));
        assert_eq!(store.get("s2"), None);
    }

    #[test]
    fn test_put_replaces_existing_record() {
        let store = UserTokenStore::new();
        store.put("s1", "tok-a", Some(3600));
        store.put("s1", "tok-b", None);
        assert_eq!(store.get("s1").as_deref(), Some("tok-b"));
    }

    #[test]
    fn test_expired_record_is_evicted_once() {
        let store = UserTokenStore::new();
        store.put("s1", "tok-a", Some(0));
        // Already at its expiry instant: absent, and evicted as a side
        // effect of the failed lookup.
        assert_eq!(store.get("s1"), None);
        assert_eq!(store.get("s1"), None);
        assert!(store.lock().sessions.is_empty());
    }

    #[test]
    fn test_record_without_ttl_does_not_expire() {
        let store = UserTokenStore::new();
        store.put("s1", "tok-a", None);
        assert_eq!(store.get("s1").as_deref(), Some("tok-a"));
    }

    #[test]
    fn test_pending_slot_last_write_wins() {
        let store = UserTokenStore::new();
        assert_eq!(store.pending(), None);
        store.set_pending("tok-a");
        store.set_pending("tok-b");
        assert_eq!(store.pending().as_deref(), Some("tok-b"));
        // Non-destructive read.
        assert_eq!(store.pending().as_deref(), Some("tok-b"));
    }
}
