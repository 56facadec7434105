//! Application state shared across handlers.

use std::sync::Arc;

use brace_session::SessionManager;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Session lifecycle over the configured storage.
    pub sessions: SessionManager,
}

impl AppState {
    /// Create a new application state.
    pub fn new(sessions: SessionManager, config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
        }
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
