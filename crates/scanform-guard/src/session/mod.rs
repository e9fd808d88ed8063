//! Server-side sessions exposed to handlers as a cheap cloneable handle.
//!
//! [`SessionLayer`] attaches a [`Session`] to every request. Handlers
//! read and write JSON values through it; after the response is built the
//! layer persists the data and sets the signed cookie, but only when
//! something was actually written.

mod layer;
mod store;

pub use layer::SessionLayer;
pub use store::{SessionStore, DEFAULT_SESSION_TTL};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Errors raised when a session value cannot be serialized.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The value could not be converted to JSON.
    #[error("session value serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Handle to the session bound to the current request.
///
/// Clones share the same underlying data: the handle the layer keeps,
/// the one a handler extracts, and the store's own entry all observe
/// each other's writes, so two in-flight requests carrying the same
/// cookie cannot lose an update to a stale copy.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    id: String,
    data: Mutex<Map<String, Value>>,
    dirty: AtomicBool,
}

impl Session {
    pub(crate) fn new(id: String, data: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id,
                data: Mutex::new(data),
                dirty: AtomicBool::new(false),
            }),
        }
    }

    /// The session id carried by the cookie.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Deserialize the value stored under `key`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.read(|data| data.get(key).cloned())?;
        serde_json::from_value(value).ok()
    }

    /// The raw JSON value stored under `key`.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.read(|data| data.get(key).cloned())
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.read(|data| data.contains_key(key))
    }

    /// Serialize `value` and store it under `key`.
    pub fn insert<T: Serialize>(&self, key: &str, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        self.update(|data| {
            data.insert(key.to_string(), value);
        });
        Ok(())
    }

    /// Remove and return the value stored under `key`.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.update(|data| data.remove(key))
    }

    /// Run a closure over the session data, marking the session written.
    pub fn update<R>(&self, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        let result = f(&mut self.lock());
        self.inner.dirty.store(true, Ordering::Release);
        result
    }

    /// Run a closure over the session data without marking it written.
    pub fn read<R>(&self, f: impl FnOnce(&Map<String, Value>) -> R) -> R {
        f(&self.lock())
    }

    /// Whether the session was written since it was last saved.
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.load(Ordering::Acquire)
    }

    pub(crate) fn mark_clean(&self) {
        self.inner.dirty.store(false, Ordering::Release);
    }

    fn lock(&self) -> MutexGuard<'_, Map<String, Value>> {
        self.inner.data.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

impl scanform_http::FromRequestParts for Session {
    fn from_request_parts(req: &scanform_http::Request) -> scanform_http::Result<Self> {
        req.extensions().get::<Session>().cloned().ok_or_else(|| {
            scanform_http::Error::internal(
                "Session missing from request extensions. Ensure SessionLayer is installed.",
            )
        })
    }
}
