//! OpenAPI documentation.

use axum::{Json, Router, routing::get};
use utoipa::OpenApi;

use super::{health, session};
use crate::state::AppState;

/// OpenAPI documentation for the session API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Brace Session API",
        description = "Cookie-keyed session store exposed over HTTP",
        version = "1.0.0",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Local server"),
    ),
    paths(
        health::health,
        session::get_session_handler,
        session::destroy_session_handler,
        session::get_value_handler,
        session::put_value_handler,
        session::delete_value_handler,
    ),
    components(
        schemas(
            health::HealthResponse,
            session::SessionView,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Current session contents"),
    )
)]
pub struct ApiDoc;

/// Serve the generated document at `/api/openapi.json`.
pub fn openapi_routes() -> Router<AppState> {
    Router::new().route(
        "/api/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_session_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/health"));
        assert!(paths.iter().any(|p| p.as_str() == "/session"));
        assert!(paths.iter().any(|p| p.as_str() == "/session/{key}"));
    }
}
