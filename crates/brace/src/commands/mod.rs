//! CLI command handlers.

pub mod config;
pub mod keygen;
pub mod purge;
pub mod serve;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result, anyhow};
use brace_config::{LoadedConfig, SameSitePolicy, SessionSection, StorageConfig};
use brace_session::{
    CookieStorage, FileStorage, Key, MemoryStorage, SameSite, SessionConfig, SessionStorage,
};
use tracing::warn;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit config file, bypassing discovery.
    pub config_file: Option<PathBuf>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Load configuration from `--config` or by layered discovery.
    ///
    /// Discovery warnings are logged, not fatal.
    pub fn load_config(&self) -> Result<LoadedConfig> {
        let loaded = match &self.config_file {
            Some(path) => brace_config::load_explicit(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => brace_config::load_config(None)?,
        };

        for warning in &loaded.warnings {
            warn!("{}", warning);
        }

        Ok(loaded)
    }
}

/// Convert the `[session]` section into lifecycle settings.
pub fn session_config(section: &SessionSection) -> Result<SessionConfig> {
    section.validate()?;

    let same_site = match section.same_site {
        SameSitePolicy::Strict => SameSite::Strict,
        SameSitePolicy::Lax => SameSite::Lax,
        SameSitePolicy::None => SameSite::None,
    };

    Ok(SessionConfig::new()
        .with_cookie_name(section.cookie_name.clone())
        .with_cookie_path(section.cookie_path.clone())
        .with_ttl(std::time::Duration::from_secs(section.ttl_secs))
        .with_expires(std::time::Duration::from_secs(section.expires_secs))
        .with_secure(section.secure)
        .with_same_site(same_site))
}

/// Build the configured storage backend.
///
/// The cookie backend inherits path, lifetime and `Secure` from the session
/// cookie so both cookies expire together.
pub fn build_storage(
    storage: &StorageConfig,
    session: &SessionConfig,
) -> Result<Arc<dyn SessionStorage>> {
    match storage {
        StorageConfig::File { .. } => {
            let dir = storage
                .file_dir()
                .ok_or_else(|| anyhow!("file storage has no directory"))?;
            Ok(Arc::new(FileStorage::new(dir)))
        }
        StorageConfig::Cookie { cookie_name, .. } => {
            let mut backend = CookieStorage::new()
                .with_path(session.cookie_path.clone())
                .with_max_age(session.expires)
                .with_secure(session.secure);
            if let Some(name) = cookie_name {
                backend = backend.with_cookie_name(name.clone());
            }
            match storage.cookie_key()? {
                Some(bytes) => {
                    let key = Key::try_from(bytes.as_slice())
                        .map_err(|e| anyhow!("invalid cookie key: {}", e))?;
                    backend = backend.with_key(key);
                }
                None => warn!(
                    "Cookie storage has no key; session data is sent to clients unencrypted"
                ),
            }
            Ok(Arc::new(backend))
        }
        StorageConfig::Memory => Ok(Arc::new(MemoryStorage::new())),
    }
}
