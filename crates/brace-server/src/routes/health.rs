//! Liveness endpoint that also reports how sessions are kept.

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// Liveness plus the session settings clients need to know about.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Storage backend name: `file`, `cookie` or `memory`.
    pub storage: String,
    /// Name of the session identifier cookie.
    pub cookie: String,
    /// Idle lifetime in seconds.
    pub ttl_secs: i64,
    /// Absolute lifetime in seconds.
    pub expires_secs: i64,
}

/// Report liveness. Never touches the caller's session.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let config = state.sessions.config();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.sessions.storage().name().to_string(),
        cookie: config.cookie_name.clone(),
        ttl_secs: config.ttl_secs(),
        expires_secs: config.expires_secs(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
