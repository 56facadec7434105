//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [server]                 # bind address, request logging
//! [session]                # cookie attributes and lifetimes
//! [storage]                # backend = "file" | "cookie" | "memory"
//! ```

use std::path::PathBuf;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Environment variable holding the base64 cookie encryption key.
pub const SESSION_KEY_ENV: &str = "BRACE_SESSION_KEY";

/// Minimum decoded key length accepted for cookie encryption.
pub const MIN_KEY_BYTES: usize = 64;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BraceConfig {
    /// Server configuration.
    pub server: Option<ServerConfig>,

    /// Session lifecycle configuration.
    pub session: Option<SessionSection>,

    /// Storage backend configuration.
    pub storage: Option<StorageConfig>,
}

impl BraceConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: BraceConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }

        if other.session.is_some() {
            self.session = other.session;
        }

        if other.storage.is_some() {
            self.storage = other.storage;
        }
    }

    /// Server section, or defaults.
    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    /// Session section, or defaults.
    pub fn session(&self) -> SessionSection {
        self.session.clone().unwrap_or_default()
    }

    /// Storage section, or defaults.
    pub fn storage(&self) -> StorageConfig {
        self.storage.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Address to bind to.
    pub bind: String,
    /// Enable request logging.
    pub request_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            request_logging: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// SameSite policy for the session cookie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    #[default]
    Lax,
    None,
}

/// Longest accepted session lifetime: ten years.
pub const MAX_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// `[session]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Name of the cookie carrying the session identifier.
    pub cookie_name: String,
    /// Path attribute of the session cookie.
    pub cookie_path: String,
    /// Idle lifetime in seconds.
    pub ttl_secs: u64,
    /// Absolute lifetime in seconds.
    pub expires_secs: u64,
    /// Send cookies over HTTPS only.
    pub secure: bool,
    /// SameSite attribute.
    pub same_site: SameSitePolicy,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            cookie_name: "SESSID".to_string(),
            cookie_path: "/".to_string(),
            ttl_secs: 3600,
            expires_secs: 86_400,
            secure: false,
            same_site: SameSitePolicy::Lax,
        }
    }
}

impl SessionSection {
    /// Reject lifetimes the lifecycle can't honour.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("session.ttl_secs", self.ttl_secs),
            ("session.expires_secs", self.expires_secs),
        ] {
            if value > MAX_LIFETIME_SECS {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("must be at most {MAX_LIFETIME_SECS} (10 years)"),
                });
            }
        }
        if self.ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.ttl_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.expires_secs < self.ttl_secs {
            return Err(ConfigError::InvalidValue {
                field: "session.expires_secs".to_string(),
                reason: format!("must be at least ttl_secs ({})", self.ttl_secs),
            });
        }
        if self.cookie_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "session.cookie_name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.same_site == SameSitePolicy::None && !self.secure {
            return Err(ConfigError::InvalidValue {
                field: "session.same_site".to_string(),
                reason: "\"none\" requires secure = true".to_string(),
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// `[storage]` section, tagged by `backend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// One JSON file per session.
    File {
        /// Directory for session files. Defaults to the platform data dir.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dir: Option<PathBuf>,
    },
    /// Whole session in a client cookie.
    Cookie {
        /// Data cookie name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cookie_name: Option<String>,
        /// Base64 encryption key (at least 64 bytes decoded).
        /// `BRACE_SESSION_KEY` takes precedence.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    /// In-process map, lost on restart.
    Memory,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::File { dir: None }
    }
}

impl StorageConfig {
    /// Backend name as written in TOML.
    pub fn backend(&self) -> &'static str {
        match self {
            StorageConfig::File { .. } => "file",
            StorageConfig::Cookie { .. } => "cookie",
            StorageConfig::Memory => "memory",
        }
    }

    /// Directory for the file backend, falling back to the platform default.
    pub fn file_dir(&self) -> Option<PathBuf> {
        match self {
            StorageConfig::File { dir: Some(dir) } => Some(dir.clone()),
            StorageConfig::File { dir: None } => Some(default_session_dir()),
            _ => None,
        }
    }

    /// Decoded cookie encryption key, from `BRACE_SESSION_KEY` or the config.
    ///
    /// `Ok(None)` means the cookie backend runs unencrypted.
    pub fn cookie_key(&self) -> Result<Option<Vec<u8>>> {
        self.cookie_key_with_env(std::env::var(SESSION_KEY_ENV).ok())
    }

    pub(crate) fn cookie_key_with_env(&self, env: Option<String>) -> Result<Option<Vec<u8>>> {
        let StorageConfig::Cookie { key, .. } = self else {
            return Ok(None);
        };

        let encoded = env.filter(|v| !v.is_empty()).or_else(|| key.clone());
        let Some(encoded) = encoded else {
            return Ok(None);
        };

        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ConfigError::InvalidValue {
                field: "storage.key".to_string(),
                reason: format!("not valid base64: {e}"),
            })?;

        if bytes.len() < MIN_KEY_BYTES {
            return Err(ConfigError::InvalidValue {
                field: "storage.key".to_string(),
                reason: format!(
                    "decodes to {} bytes, need at least {MIN_KEY_BYTES}",
                    bytes.len()
                ),
            });
        }

        Ok(Some(bytes))
    }
}

/// Default directory for file-backed sessions.
pub fn default_session_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("brace-session").join("sessions"))
        .unwrap_or_else(|| PathBuf::from("sessions"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
