//! Configuration system for the Brace session server.
//!
//! Provides TOML-based configuration with:
//! - `[server]`, `[session]` and `[storage]` sections, all optional
//! - Config file layering (XDG user config + project-local overrides)
//! - Cookie encryption key resolution (env var → config file)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigLayer, ConfigSource, LoadedConfig, load_config, load_config_file,
    load_config_with_options, load_explicit, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
