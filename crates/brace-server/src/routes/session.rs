//! Endpoints reading and mutating the caller's own session.

use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{Result, ServerError};
use crate::middleware::CurrentSession;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Contents of the current session.
///
/// The identifier is not included; it only travels in the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionView {
    /// User data.
    #[schema(value_type = Object)]
    pub data: Value,
    /// Whether the session holds no user data.
    pub empty: bool,
}

impl SessionView {
    fn of(session: &CurrentSession) -> Self {
        Self {
            data: session.to_json(),
            empty: session.is_empty(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /session - Current session contents.
#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Session contents", body = SessionView),
    ),
    tag = "session"
)]
pub async fn get_session_handler(session: CurrentSession) -> Json<SessionView> {
    Json(SessionView::of(&session))
}

/// DELETE /session - Destroy the session and expire its cookie.
#[utoipa::path(
    delete,
    path = "/session",
    responses(
        (status = 204, description = "Session destroyed"),
    ),
    tag = "session"
)]
pub async fn destroy_session_handler(session: CurrentSession) -> StatusCode {
    session.destroy();
    StatusCode::NO_CONTENT
}

/// GET /session/{key} - Read one value.
#[utoipa::path(
    get,
    path = "/session/{key}",
    params(("key" = String, Path, description = "Session key")),
    responses(
        (status = 200, description = "Stored value"),
        (status = 404, description = "Key not set"),
    ),
    tag = "session"
)]
pub async fn get_value_handler(
    session: CurrentSession,
    Path(key): Path<String>,
) -> Result<Json<Value>> {
    session
        .get_value(&key)
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("session key '{}'", key)))
}

/// PUT /session/{key} - Store a JSON value.
#[utoipa::path(
    put,
    path = "/session/{key}",
    params(("key" = String, Path, description = "Session key")),
    responses(
        (status = 200, description = "Updated session", body = SessionView),
        (status = 400, description = "Reserved key"),
    ),
    tag = "session"
)]
pub async fn put_value_handler(
    session: CurrentSession,
    Path(key): Path<String>,
    Json(value): Json<Value>,
) -> Result<Json<SessionView>> {
    if key.trim().is_empty() {
        return Err(ServerError::BadRequest("session key must not be empty".to_string()));
    }
    session.set(&key, value)?;
    Ok(Json(SessionView::of(&session)))
}

/// DELETE /session/{key} - Remove one value.
#[utoipa::path(
    delete,
    path = "/session/{key}",
    params(("key" = String, Path, description = "Session key")),
    responses(
        (status = 204, description = "Value removed"),
        (status = 404, description = "Key not set"),
    ),
    tag = "session"
)]
pub async fn delete_value_handler(
    session: CurrentSession,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    match session.remove(&key) {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ServerError::NotFound(format!("session key '{}'", key))),
    }
}

/// Create session routes. Requires the session middleware.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/session",
            get(get_session_handler).delete(destroy_session_handler),
        )
        .route(
            "/session/{key}",
            get(get_value_handler)
                .put(put_value_handler)
                .delete(delete_value_handler),
        )
}
