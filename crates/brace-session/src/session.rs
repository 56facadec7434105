//! The per-request session handle exposed to handlers.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::record::{SessionRecord, is_reserved};

#[derive(Debug)]
struct SessionInner {
    id: String,
    record: SessionRecord,
    snapshot: Map<String, Value>,
    destroyed: bool,
}

/// A session key/value store.
///
/// Cloning is cheap and every clone sees the same data, so the middleware
/// can keep one handle while the handler mutates another.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
}

impl Session {
    /// Wrap a loaded record. The current user data becomes the baseline for
    /// [`has_changed`](Self::has_changed).
    pub fn new(id: impl Into<String>, record: SessionRecord) -> Self {
        let snapshot = record.user_data();
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                id: id.into(),
                record,
                snapshot,
                destroyed: false,
            })),
        }
    }

    /// The session identifier.
    pub fn id(&self) -> String {
        self.inner.lock().id.clone()
    }

    /// Store a value under `key`.
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<()> {
        if is_reserved(key) {
            return Err(Error::ReservedKey(key.to_string()));
        }
        let value = serde_json::to_value(value)?;
        self.inner.lock().record.insert(key, value);
        Ok(())
    }

    /// Read and deserialize the value under `key`.
    ///
    /// Returns `None` if the key is missing or holds a different type.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_value(key)
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Like [`get`](Self::get), falling back to `default`.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Raw JSON value under `key`.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        if is_reserved(key) {
            return None;
        }
        self.inner.lock().record.get(key).cloned()
    }

    /// Remove `key`, returning its previous value.
    pub fn remove(&self, key: &str) -> Option<Value> {
        if is_reserved(key) {
            return None;
        }
        self.inner.lock().record.remove(key)
    }

    /// Remove all user data.
    pub fn clear(&self) {
        self.inner.lock().record.clear_user_data();
    }

    /// Whether `key` holds a value.
    pub fn has(&self, key: &str) -> bool {
        !is_reserved(key) && self.inner.lock().record.get(key).is_some()
    }

    /// Whether user data differs from what was loaded.
    pub fn has_changed(&self) -> bool {
        let inner = self.inner.lock();
        inner.record.user_data() != inner.snapshot
    }

    /// Whether the session holds no user data.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().record.user_entries().next().is_none()
    }

    /// User data as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.inner.lock().record.user_data())
    }

    /// Mark the session for deletion when the response is committed.
    pub fn destroy(&self) {
        let mut inner = self.inner.lock();
        inner.record.clear_user_data();
        inner.destroyed = true;
    }

    /// Whether [`destroy`](Self::destroy) was called.
    pub fn is_destroyed(&self) -> bool {
        self.inner.lock().destroyed
    }

    /// Full record including bookkeeping, for persistence.
    pub fn record(&self) -> SessionRecord {
        self.inner.lock().record.clone()
    }

    /// Reset the change baseline after a successful write.
    pub(crate) fn mark_saved(&self) {
        let mut inner = self.inner.lock();
        inner.snapshot = inner.record.user_data();
    }
}
