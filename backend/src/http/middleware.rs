//! Request middleware: session authentication and request timing.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, info};

use super::error::AppError;
use super::extract::AuthUser;
use super::state::AppState;

/// Name of the session cookie.
pub const AUTH_COOKIE: &str = "auth";

/// Session token from the `auth` cookie, falling back to `Authorization: Bearer`.
fn session_token(jar: &CookieJar, req: &Request) -> Option<String> {
    jar.get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| {
            req.headers()
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(|t| t.trim().to_string())
        })
}

/// Reject requests without a valid session; otherwise insert [`AuthUser`].
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(&jar, &req)
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let claims = state
        .jwt
        .validate_token(&token)
        .map_err(|_| AppError::Unauthorized("Invalid or expired session".to_string()))?;
    let id = claims
        .user_id()
        .map_err(|_| AppError::Unauthorized("Invalid or expired session".to_string()))?;

    debug!("Authenticated user {}", id);
    req.extensions_mut().insert(AuthUser { id });
    Ok(next.run(req).await)
}

/// Log method, path, status and latency of every request.
pub async fn log_request_timing(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    info!(
        "{} {} {} {}ms",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}
