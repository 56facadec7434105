//! Client-side storage: the whole record travels in a cookie.
//!
//! Without a key the payload is plain JSON and a client can edit it freely.
//! With a [`Key`] the cookie goes through the private jar, which encrypts and
//! authenticates it (AES-256-GCM); a tampered cookie loads as no session.

use std::time::Duration;

use async_trait::async_trait;
use cookie::{Cookie, CookieJar, Key, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::SessionStorage;
use crate::config::whole_secs;
use crate::error::{Error, Result};
use crate::record::SessionRecord;

/// Default name of the cookie holding session data.
pub const DEFAULT_DATA_COOKIE_NAME: &str = "X-SESS-D";

/// Browsers drop cookies larger than this.
const MAX_COOKIE_BYTES: usize = 4096;

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    sess_id: String,
    data: SessionRecord,
}

/// Keeps each session in a cookie on the client.
#[derive(Clone)]
pub struct CookieStorage {
    cookie_name: String,
    path: String,
    max_age: Duration,
    secure: bool,
    key: Option<Key>,
}

impl std::fmt::Debug for CookieStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieStorage")
            .field("cookie_name", &self.cookie_name)
            .field("path", &self.path)
            .field("max_age", &self.max_age)
            .field("secure", &self.secure)
            .field("encrypted", &self.key.is_some())
            .finish()
    }
}

impl Default for CookieStorage {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_DATA_COOKIE_NAME.to_string(),
            path: "/".to_string(),
            max_age: crate::config::DEFAULT_EXPIRES,
            secure: false,
            key: None,
        }
    }
}

impl CookieStorage {
    /// Create a plaintext cookie storage with the default cookie name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encrypt and authenticate the cookie with `key`.
    pub fn with_key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    /// Set the data cookie name.
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the data cookie path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the data cookie `Max-Age`.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Mark the data cookie `Secure`.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Name of the data cookie.
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Whether the cookie is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.key.is_some()
    }

    fn read(&self, jar: &CookieJar) -> Option<String> {
        match &self.key {
            Some(key) => {
                jar.get(&self.cookie_name)?;
                match jar.private(key).get(&self.cookie_name) {
                    Some(cookie) => Some(cookie.value().to_string()),
                    None => {
                        warn!(cookie = %self.cookie_name, "Rejected tampered session cookie");
                        None
                    }
                }
            }
            None => jar.get(&self.cookie_name).map(|c| c.value().to_string()),
        }
    }

    fn removal(&self) -> Cookie<'static> {
        Cookie::build(self.cookie_name.clone())
            .path(self.path.clone())
            .build()
    }
}

#[async_trait]
impl SessionStorage for CookieStorage {
    async fn load(&self, key: &str, jar: &CookieJar) -> Result<Option<SessionRecord>> {
        let Some(value) = self.read(jar) else {
            return Ok(None);
        };

        let payload: Payload = match serde_json::from_str(&value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(cookie = %self.cookie_name, error = %e, "Malformed session data cookie");
                return Ok(None);
            }
        };

        if payload.sess_id != key {
            debug!(cookie = %self.cookie_name, "Session data cookie belongs to another session");
            return Ok(None);
        }

        Ok(Some(payload.data))
    }

    async fn write(&self, key: &str, record: &SessionRecord, jar: &mut CookieJar) -> Result<()> {
        let payload = Payload {
            sess_id: key.to_string(),
            data: record.clone(),
        };
        let value = serde_json::to_string(&payload)?;

        let cookie = Cookie::build((self.cookie_name.clone(), value))
            .path(self.path.clone())
            .max_age(cookie::time::Duration::seconds(whole_secs(self.max_age)))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build();

        match &self.key {
            Some(k) => jar.private_mut(k).add(cookie),
            None => jar.add(cookie),
        }

        if let Some(sent) = jar.get(&self.cookie_name) {
            let size = sent.encoded().to_string().len();
            if size > MAX_COOKIE_BYTES {
                jar.remove(self.removal());
                return Err(Error::Storage(format!(
                    "session data cookie is {size} bytes, limit is {MAX_COOKIE_BYTES}"
                )));
            }
        }

        Ok(())
    }

    async fn destroy(&self, _key: &str, jar: &mut CookieJar) -> Result<()> {
        jar.remove(self.removal());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cookie"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> SessionRecord {
        let mut record = SessionRecord::new();
        record.insert("foo", json!("bar"));
        record
    }

    /// Carry the response cookies of `jar` into a fresh request jar.
    fn next_request(jar: &CookieJar) -> CookieJar {
        let mut next = CookieJar::new();
        for cookie in jar.delta() {
            let parsed = Cookie::parse_encoded(cookie.encoded().to_string())
                .unwrap()
                .into_owned();
            if parsed.max_age() != Some(cookie::time::Duration::ZERO) {
                next.add_original(Cookie::new(
                    parsed.name().to_string(),
                    parsed.value().to_string(),
                ));
            }
        }
        next
    }

    #[tokio::test]
    async fn test_no_cookie_loads_none() {
        let storage = CookieStorage::new();
        assert_eq!(storage.load("abc", &CookieJar::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_then_load_plaintext() {
        let storage = CookieStorage::new();
        let mut jar = CookieJar::new();

        storage.write("abc", &record(), &mut jar).await.unwrap();

        let sent = jar.get(DEFAULT_DATA_COOKIE_NAME).unwrap();
        let payload: serde_json::Value = serde_json::from_str(sent.value()).unwrap();
        assert_eq!(payload["sess_id"], json!("abc"));
        assert_eq!(payload["data"]["foo"], json!("bar"));

        let next = next_request(&jar);
        assert_eq!(storage.load("abc", &next).await.unwrap(), Some(record()));
    }

    #[tokio::test]
    async fn test_other_session_loads_none() {
        let storage = CookieStorage::new();
        let mut jar = CookieJar::new();
        storage.write("abc", &record(), &mut jar).await.unwrap();

        let next = next_request(&jar);
        assert_eq!(storage.load("xyz", &next).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_cookie_loads_none() {
        let storage = CookieStorage::new();
        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new(DEFAULT_DATA_COOKIE_NAME, "{nope"));

        assert_eq!(storage.load("abc", &jar).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_encrypted_roundtrip_hides_payload() {
        let storage = CookieStorage::new().with_key(Key::generate());
        let mut jar = CookieJar::new();

        storage.write("abc", &record(), &mut jar).await.unwrap();

        let sent = jar.get(DEFAULT_DATA_COOKIE_NAME).unwrap();
        assert!(!sent.value().contains("foo"));

        let next = next_request(&jar);
        assert_eq!(storage.load("abc", &next).await.unwrap(), Some(record()));
    }

    #[tokio::test]
    async fn test_encrypted_rejects_foreign_key_and_plaintext() {
        let writer = CookieStorage::new().with_key(Key::generate());
        let reader = CookieStorage::new().with_key(Key::generate());
        let mut jar = CookieJar::new();
        writer.write("abc", &record(), &mut jar).await.unwrap();

        let next = next_request(&jar);
        assert_eq!(reader.load("abc", &next).await.unwrap(), None);

        let mut forged = CookieJar::new();
        forged.add_original(Cookie::new(
            DEFAULT_DATA_COOKIE_NAME,
            r#"{"sess_id":"abc","data":{"admin":true}}"#,
        ));
        assert_eq!(writer.load("abc", &forged).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_destroy_removes_cookie() {
        let storage = CookieStorage::new();
        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new(DEFAULT_DATA_COOKIE_NAME, "{}"));

        storage.destroy("abc", &mut jar).await.unwrap();

        assert!(jar.get(DEFAULT_DATA_COOKIE_NAME).is_none());
        let removal = jar.delta().next().unwrap();
        assert_eq!(removal.name(), DEFAULT_DATA_COOKIE_NAME);
        assert_eq!(removal.max_age(), Some(cookie::time::Duration::ZERO));
    }

    #[tokio::test]
    async fn test_oversized_payload_is_rejected() {
        let storage = CookieStorage::new();
        let mut jar = CookieJar::new();
        let mut big = SessionRecord::new();
        big.insert("blob", json!("x".repeat(5000)));

        let err = storage.write("abc", &big, &mut jar).await;

        assert!(matches!(err, Err(Error::Storage(_))));
        assert!(jar.get(DEFAULT_DATA_COOKIE_NAME).is_none());
    }
}
