//! Cookie-keyed HTTP sessions with server-side expiry.
//!
//! This crate provides the framework-independent half of session handling:
//! - [`SessionManager`] loads a session by cookie identifier, validates its
//!   idle and absolute deadlines, starts a new one when needed, and persists
//!   it only when handlers changed something
//! - [`Session`] is the key/value store handlers read and mutate
//! - [`SessionStorage`] backends keep records on disk, in a cookie, or in
//!   memory
//!
//! # Example
//!
//! ```rust,ignore
//! use brace_session::{FileStorage, SessionConfig, SessionManager};
//!
//! let manager = SessionManager::new(
//!     FileStorage::new("/var/lib/brace/sessions"),
//!     SessionConfig::default().with_ttl(Duration::from_secs(1800)),
//! );
//!
//! let session = manager.load(&mut jar).await?;
//! session.set("user", "alice")?;
//! manager.commit(&session, &mut jar).await?;
//! ```

mod config;
mod error;
pub mod id;
mod manager;
pub mod record;
mod session;
pub mod storage;

pub use config::{
    DEFAULT_COOKIE_NAME, DEFAULT_COOKIE_PATH, DEFAULT_EXPIRES, DEFAULT_TTL, SessionConfig,
};
pub use error::{Error, Result};
pub use manager::{SessionManager, SessionSlot};
pub use record::SessionRecord;
pub use session::Session;
pub use storage::{CookieStorage, FileStorage, MemoryStorage, SessionStorage};

pub use cookie::{Cookie, CookieJar, Key, SameSite};
