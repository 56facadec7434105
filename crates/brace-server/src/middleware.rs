//! Session middleware and extractor.
//!
//! [`session_middleware`] parses the request cookies, puts a lazy
//! [`SessionSlot`] into request extensions, and after the handler returns
//! commits the session and appends the resulting `Set-Cookie` headers.
//! Handlers get at the session through the [`CurrentSession`] extractor; the
//! first extraction is what actually loads it from storage.

use std::ops::Deref;

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, SET_COOKIE},
        request::Parts,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use brace_session::{Cookie, CookieJar, Session, SessionManager, SessionSlot};
use tracing::{debug, warn};

use crate::error::ServerError;

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Session middleware function.
///
/// Install with `axum::middleware::from_fn_with_state(manager, session_middleware)`.
pub async fn session_middleware(
    State(manager): State<SessionManager>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let slot = SessionSlot::new(manager.clone(), request_jar(request.headers()));
    request.extensions_mut().insert(slot.clone());

    let mut response = next.run(request).await;

    let Some(session) = slot.loaded() else {
        return response;
    };
    let mut jar = slot.jar().await;

    if let Err(e) = manager.commit(&session, &mut jar).await {
        return ServerError::from(e).into_response();
    }

    append_set_cookies(response.headers_mut(), &jar);
    response
}

/// Build a jar from every `Cookie` header on the request.
pub fn request_jar(headers: &HeaderMap) -> CookieJar {
    let mut jar = CookieJar::new();
    for value in headers.get_all(COOKIE) {
        let Ok(value) = value.to_str() else {
            warn!("Ignoring non-ASCII Cookie header");
            continue;
        };
        for cookie in Cookie::split_parse_encoded(value) {
            match cookie {
                Ok(cookie) => jar.add_original(cookie.into_owned()),
                Err(e) => debug!(error = %e, "Skipping unparsable cookie"),
            }
        }
    }
    jar
}

/// Append a `Set-Cookie` header for every cookie the jar changed.
pub fn append_set_cookies(headers: &mut HeaderMap, jar: &CookieJar) {
    for cookie in jar.delta() {
        match HeaderValue::from_str(&cookie.encoded().to_string()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => warn!(cookie = %cookie.name(), error = %e, "Dropping unencodable cookie"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Extractor
// ─────────────────────────────────────────────────────────────────────────────

/// The current request's session.
///
/// Extracting this loads the session (once per request). Requires
/// [`session_middleware`] on the route.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl Deref for CurrentSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let slot = parts.extensions.get::<SessionSlot>().cloned().ok_or_else(|| {
            ServerError::Internal("session middleware is not installed".to_string())
        })?;
        Ok(CurrentSession(slot.get().await?))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
