//! Registration, sign-in and the current user.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use super::HandlerResult;
use crate::auth::service;
use crate::http::dto::{AuthResponse, RegisterRequest, SignInRequest, User};
use crate::http::error::AppError;
use crate::http::extract::{AppJson, AuthUser};
use crate::http::middleware::AUTH_COOKIE;
use crate::http::state::AppState;

fn session_cookie(response: &AuthResponse) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        AUTH_COOKIE, response.token, response.expires_in
    )
}

fn with_cookie(status: StatusCode, response: AuthResponse) -> impl IntoResponse {
    let cookie = session_cookie(&response);
    (status, AppendHeaders([(SET_COOKIE, cookie)]), Json(response))
}

/// POST /v1/auth/register and POST /v1/auth/sign-up
pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = service::register(state.repository.as_ref(), &state.jwt, request).await?;
    Ok(with_cookie(StatusCode::CREATED, response))
}

/// POST /v1/auth/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    AppJson(request): AppJson<SignInRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = service::sign_in(state.repository.as_ref(), &state.jwt, request).await?;
    Ok(with_cookie(StatusCode::OK, response))
}

/// GET /v1/auth/me
pub async fn me(State(state): State<AppState>, user: AuthUser) -> HandlerResult<User> {
    let user = service::current_user(state.repository.as_ref(), user.id).await?;
    Ok(Json(user))
}
