#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use squad_backend::auth::JwtHandler;
use squad_backend::db::{FullRepository, LocalRepository};
use squad_backend::http::{create_router, AppState};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub const TEST_SECRET: &str = "integration-test-secret";

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Router over a fresh in-memory repository.
pub fn test_app() -> Router {
    let repo = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
    create_router(AppState::new(repo, Arc::new(JwtHandler::new(TEST_SECRET))))
}

/// Response status, headers and JSON body (`Null` when empty).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

/// Send one request. The session token travels in the `auth` cookie.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("auth={}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(app: &Router, uri: &str, token: &str) -> TestResponse {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post(app: &Router, uri: &str, token: &str, body: Value) -> TestResponse {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn patch(app: &Router, uri: &str, token: &str, body: Value) -> TestResponse {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, token: &str) -> TestResponse {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Register a user and return its id and session token.
pub async fn register(app: &Router, name: &str, email: &str) -> (String, String) {
    let response = send(
        app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(json!({ "name": name, "email": email, "password": "password123" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    (
        response.body["data"]["id"].as_str().unwrap().to_string(),
        response.body["token"].as_str().unwrap().to_string(),
    )
}

pub async fn create_team(app: &Router, token: &str, full_name: &str, short_name: &str) -> String {
    let response = post(
        app,
        "/v1/teams",
        token,
        json!({ "fullName": full_name, "shortName": short_name, "mainColorHex": "FF0000" }),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["id"].as_str().unwrap().to_string()
}

pub async fn create_athlete(
    app: &Router,
    token: &str,
    team_id: &str,
    name: &str,
    shirt_number: i32,
    position: &str,
) -> String {
    let response = post(
        app,
        &format!("/v1/teams/{}/athletes", team_id),
        token,
        json!({
            "name": name,
            "birthdate": "2000-05-17",
            "shirtNumber": shirt_number,
            "position": position,
        }),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["id"].as_str().unwrap().to_string()
}
