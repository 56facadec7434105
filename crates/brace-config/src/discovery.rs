//! Config discovery, layering and post-merge checks.
//!
//! Layers, lowest precedence first:
//! 1. `~/.config/brace-session/config.toml` (or `$BRACE_SESSION_CONFIG_DIR`)
//! 2. `./brace-session.toml`
//!
//! An explicit `--config` file replaces discovery entirely. CLI flags are
//! applied by the caller on top of the result.
//!
//! Once merged, the config is checked for problems that would only surface
//! at request time: unusable session lifetimes, an undecodable cookie key,
//! or session data about to travel to clients in plaintext.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{BraceConfig, ConfigError, Result, SESSION_KEY_ENV, StorageConfig};

const PROJECT_CONFIG_FILE: &str = "brace-session.toml";
const USER_CONFIG_FILE: &str = "config.toml";
const APP_NAME: &str = "brace-session";
const CONFIG_DIR_ENV: &str = "BRACE_SESSION_CONFIG_DIR";

/// Where a config layer comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Per-user config directory.
    User,
    /// Working-directory override.
    Project,
    /// File named on the command line.
    Explicit,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigLayer::User => "user",
            ConfigLayer::Project => "project",
            ConfigLayer::Explicit => "explicit",
        })
    }
}

/// One file that was considered during loading.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub layer: ConfigLayer,
    pub path: PathBuf,
    /// Whether the file existed and parsed.
    pub loaded: bool,
}

/// Merged configuration plus everything learned while building it.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: BraceConfig,
    /// Sources in precedence order (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Non-fatal problems: unreadable layers and failed checks.
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Paths of the sources that contributed to the config.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }

    fn finish(mut self, env_key: Option<String>) -> Self {
        self.warnings.extend(check(&self.config, env_key));
        self
    }
}

/// Discover and merge the user and project layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// [`load_config`] with an explicit user config directory.
///
/// `config_dir` wins over `BRACE_SESSION_CONFIG_DIR` and the platform
/// default.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut loaded = LoadedConfig {
        config: BraceConfig::new(),
        sources: Vec::new(),
        warnings: Vec::new(),
    };

    let user_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };
    if let Some(path) = user_path {
        merge_layer(&mut loaded, ConfigLayer::User, path);
    }

    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    merge_layer(&mut loaded, ConfigLayer::Project, project_path);

    Ok(loaded.finish(session_key_env()))
}

/// Load exactly one file, skipping discovery.
///
/// Unlike discovered layers, a missing or broken explicit file is an error.
pub fn load_explicit(path: &Path) -> Result<LoadedConfig> {
    let loaded = LoadedConfig {
        config: load_config_file(path)?,
        sources: vec![ConfigSource {
            layer: ConfigLayer::Explicit,
            path: path.to_path_buf(),
            loaded: true,
        }],
        warnings: Vec::new(),
    };
    Ok(loaded.finish(session_key_env()))
}

/// Parse a single config file.
pub fn load_config_file(path: &Path) -> Result<BraceConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    BraceConfig::from_toml(&contents)
}

/// Path of the user config file.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// User config directory: `BRACE_SESSION_CONFIG_DIR`, else the platform
/// config dir joined with `brace-session`.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

fn session_key_env() -> Option<String> {
    std::env::var(SESSION_KEY_ENV).ok().filter(|v| !v.is_empty())
}

fn merge_layer(loaded: &mut LoadedConfig, layer: ConfigLayer, path: PathBuf) {
    let mut source = ConfigSource {
        layer,
        path,
        loaded: false,
    };

    if source.path.is_file() {
        match load_config_file(&source.path) {
            Ok(config) => {
                loaded.config.merge(config);
                source.loaded = true;
            }
            Err(e) => loaded.warnings.push(format!(
                "Ignoring {} config {}: {}",
                layer,
                source.path.display(),
                e
            )),
        }
    }

    loaded.sources.push(source);
}

/// Problems in a merged config. `env_key` is the value of
/// `BRACE_SESSION_KEY`, which overrides any key in the file.
fn check(config: &BraceConfig, env_key: Option<String>) -> Vec<String> {
    let mut problems = Vec::new();

    if let Err(e) = config.session().validate() {
        problems.push(e.to_string());
    }

    let storage = config.storage();
    if let StorageConfig::Cookie { key, .. } = &storage {
        match (key.is_some(), env_key.is_some()) {
            (true, true) => problems.push(format!(
                "[storage] key is ignored because {SESSION_KEY_ENV} is set"
            )),
            (true, false) => problems.push(format!(
                "[storage] contains a plaintext cookie key. Consider setting {SESSION_KEY_ENV} instead."
            )),
            _ => {}
        }

        match storage.cookie_key_with_env(env_key) {
            Ok(Some(_)) => {}
            Ok(None) => problems.push(format!(
                "cookie storage has no key; session data is sent to clients unencrypted (set {SESSION_KEY_ENV})"
            )),
            Err(e) => problems.push(e.to_string()),
        }
    }

    problems
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
