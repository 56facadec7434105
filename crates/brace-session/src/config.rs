//! Configuration for the session lifecycle.

use std::time::Duration;

use cookie::SameSite;

/// Default name of the cookie carrying the session identifier.
pub const DEFAULT_COOKIE_NAME: &str = "SESSID";

/// Default path attribute of the session cookie.
pub const DEFAULT_COOKIE_PATH: &str = "/";

/// Default idle lifetime; renewed every time a valid session is loaded.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Default absolute lifetime, counted from session creation.
pub const DEFAULT_EXPIRES: Duration = Duration::from_secs(86_400);

/// Configuration for [`SessionManager`](crate::SessionManager).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session identifier.
    pub cookie_name: String,

    /// Path attribute of the session cookie.
    pub cookie_path: String,

    /// Idle lifetime. A session not loaded within this window is discarded.
    pub ttl: Duration,

    /// Absolute lifetime. Also used as the cookie `Max-Age`.
    pub expires: Duration,

    /// Send the cookie over HTTPS only.
    pub secure: bool,

    /// Hide the cookie from scripts.
    pub http_only: bool,

    /// SameSite attribute of the session cookie.
    pub same_site: SameSite,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_path: DEFAULT_COOKIE_PATH.to_string(),
            ttl: DEFAULT_TTL,
            expires: DEFAULT_EXPIRES,
            secure: false,
            http_only: true,
            same_site: SameSite::Lax,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session cookie name.
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the session cookie path.
    pub fn with_cookie_path(mut self, path: impl Into<String>) -> Self {
        self.cookie_path = path.into();
        self
    }

    /// Set the idle lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the absolute lifetime.
    pub fn with_expires(mut self, expires: Duration) -> Self {
        self.expires = expires;
        self
    }

    /// Mark the cookie `Secure`.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set the `HttpOnly` flag.
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set the SameSite attribute.
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Idle lifetime in whole seconds, saturating at `i64::MAX`.
    pub fn ttl_secs(&self) -> i64 {
        whole_secs(self.ttl)
    }

    /// Absolute lifetime in whole seconds, saturating at `i64::MAX`.
    pub fn expires_secs(&self) -> i64 {
        whole_secs(self.expires)
    }
}

pub(crate) fn whole_secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}
