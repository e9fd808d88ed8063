//! In-memory session store with per-entry expiry.

use super::Session;
use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default session lifetime: 12 hours.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Characters in a generated session id.
const SESSION_ID_LENGTH: usize = 32;

struct StoredSession {
    session: Session,
    expires_at: Instant,
}

/// Shared in-memory session store.
///
/// Entries hold the same shared state as the [`Session`] handles given
/// to requests, so concurrent requests carrying one cookie operate on a
/// single object and writes are never lost to a stale copy. Entries
/// expire a fixed time after their last save and are dropped lazily
/// when next looked up.
#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<DashMap<String, StoredSession>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create a store with the default lifetime.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }

    /// Create a store whose entries live for `ttl` after each save.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// The configured entry lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up the session for an id.
    ///
    /// Returns `None` for unknown ids and for entries past their expiry,
    /// removing the latter.
    pub fn load(&self, id: &str) -> Option<Session> {
        let entry = self.entries.get(id)?;
        if entry.expires_at > Instant::now() {
            return Some(entry.session.clone());
        }
        let key = entry.key().clone();
        drop(entry);
        self.entries.remove(&key);
        None
    }

    /// Persist a session, refreshing its expiry and clearing its dirty
    /// flag.
    pub fn save(&self, session: &Session) {
        self.entries.insert(
            session.id().to_string(),
            StoredSession {
                session: session.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        session.mark_clean();
    }

    /// Drop a session outright.
    pub fn remove(&self, id: &str) {
        self.entries.remove(id);
    }

    /// Number of live entries, counting those not yet lazily evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Generate a fresh alphanumeric session id.
    pub(crate) fn generate_id() -> String {
        OsRng
            .sample_iter(&Alphanumeric)
            .take(SESSION_ID_LENGTH)
            .map(char::from)
            .collect()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn session_with(id: &str, key: &str, value: Value) -> Session {
        let mut map = Map::new();
        map.insert(key.to_string(), value);
        Session::new(id.to_string(), map)
    }

    #[test]
    fn saved_sessions_share_state_with_loaded_handles() {
        let store = SessionStore::new();
        store.save(&session_with("abc", "records", json!([])));

        let loaded = store.load("abc").unwrap();
        assert_eq!(loaded.get_value("records"), Some(json!([])));

        // a write through one handle is visible through the next load
        loaded.insert("p", "none").unwrap();
        let again = store.load("abc").unwrap();
        assert_eq!(again.get_value("p"), Some(json!("none")));
    }

    #[test]
    fn unknown_ids_load_nothing() {
        let store = SessionStore::new();
        assert!(store.load("missing").is_none());
    }

    #[test]
    fn expired_entries_are_evicted_on_load() {
        let store = SessionStore::with_ttl(Duration::ZERO);
        store.save(&session_with("abc", "records", json!([])));

        assert!(store.load("abc").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn save_clears_the_dirty_flag() {
        let store = SessionStore::new();
        let session = session_with("abc", "records", json!([]));
        session.insert("p", "none").unwrap();
        assert!(session.is_dirty());

        store.save(&session);
        assert!(!session.is_dirty());
    }

    #[test]
    fn saving_twice_keeps_one_entry() {
        let store = SessionStore::new();
        let session = session_with("abc", "p", json!("none"));
        store.save(&session);
        store.save(&session);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn generated_ids_are_alphanumeric_and_distinct() {
        let first = SessionStore::generate_id();
        let second = SessionStore::generate_id();

        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }
}
