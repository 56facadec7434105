//! axum integration and demo HTTP server for Brace sessions.
//!
//! # Features
//!
//! - [`session_middleware`] loads sessions lazily and persists them after
//!   the handler runs
//! - [`CurrentSession`] extractor for handlers
//! - A small REST surface over the caller's own session
//! - Request logging
//!
//! # Example
//!
//! ```ignore
//! use brace_server::{AppState, Server, ServerConfig};
//! use brace_session::{FileStorage, SessionConfig, SessionManager};
//!
//! let sessions = SessionManager::new(FileStorage::new("sessions"), SessionConfig::default());
//! let config = ServerConfig::new().with_bind_address("127.0.0.1:8080".parse()?);
//!
//! Server::new(AppState::new(sessions, config)).run().await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use logging::request_logging_middleware;
pub use middleware::{CurrentSession, append_set_cookies, request_jar, session_middleware};
pub use state::AppState;

use std::net::SocketAddr;

use axum::{Router, middleware as axum_middleware};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The Brace session HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a server from application state.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::health_routes())
            .merge(routes::openapi_routes())
            .merge(self.session_routes())
            .layer(axum_middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Routes that use the session, wrapped in the session middleware.
    fn session_routes(&self) -> Router<AppState> {
        routes::session_routes().layer(axum_middleware::from_fn_with_state(
            self.state.sessions.clone(),
            middleware::session_middleware,
        ))
    }

    /// Run the server on the configured address.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let router = self.router();

        if let Ok(addr) = listener.local_addr() {
            info!(
                addr = %addr,
                storage = self.state.sessions.storage().name(),
                "Starting server"
            );
        }

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}
