//! Storage backends for session records.
//!
//! The lifecycle is decoupled from where records live through the
//! [`SessionStorage`] trait. Every method receives the request's
//! [`CookieJar`]: server-side backends ignore it, while [`CookieStorage`]
//! keeps the whole record on the client through it.

mod cookies;
mod file;
mod memory;

pub use self::cookies::{CookieStorage, DEFAULT_DATA_COOKIE_NAME};
pub use self::file::FileStorage;
pub use self::memory::MemoryStorage;

use std::sync::Arc;

use async_trait::async_trait;
use cookie::CookieJar;

use crate::error::Result;
use crate::record::SessionRecord;

/// Trait for session storage backends.
///
/// `key` is the storage key derived from the session identifier (see
/// [`crate::id::storage_key`]), never the full identifier.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Load the record stored under `key`.
    ///
    /// Return `Ok(None)` if nothing is stored.
    async fn load(&self, key: &str, jar: &CookieJar) -> Result<Option<SessionRecord>>;

    /// Persist `record` under `key`, replacing whatever was there.
    async fn write(&self, key: &str, record: &SessionRecord, jar: &mut CookieJar) -> Result<()>;

    /// Delete the record stored under `key`. Deleting nothing succeeds.
    async fn destroy(&self, key: &str, jar: &mut CookieJar) -> Result<()>;

    /// Short label used in logs.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<S: SessionStorage + ?Sized> SessionStorage for Arc<S> {
    async fn load(&self, key: &str, jar: &CookieJar) -> Result<Option<SessionRecord>> {
        (**self).load(key, jar).await
    }

    async fn write(&self, key: &str, record: &SessionRecord, jar: &mut CookieJar) -> Result<()> {
        (**self).write(key, record, jar).await
    }

    async fn destroy(&self, key: &str, jar: &mut CookieJar) -> Result<()> {
        (**self).destroy(key, jar).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
