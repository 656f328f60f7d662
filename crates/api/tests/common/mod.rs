#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use episodic_api::auth::password::hash_password;
use episodic_api::auth::tokens::TokenConfig;
use episodic_api::config::ServerConfig;
use episodic_api::limiter::RateLimitConfig;
use episodic_api::router::build_app_router;
use episodic_api::state::AppState;
use episodic_core::tokens::Scope;
use episodic_db::models::user::{NewUser, User};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const PASSWORD: &str = "pa55word";

/// Build a test `ServerConfig` with safe defaults.
///
/// The rate limiter is disabled so tests can issue any number of requests;
/// rate-limit tests switch it back on.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        db_max_connections: 1,
        rate_limit: RateLimitConfig {
            enabled: false,
            ..Default::default()
        },
        tokens: TokenConfig::default(),
    }
}

/// State over empty in-memory stores.
pub fn test_state() -> AppState {
    AppState::in_memory(test_config())
}

/// The production router over the given state.
pub fn build_test_app(state: AppState) -> Router {
    build_app_router(state)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user directly through the stores, grant `permissions`, and
/// issue an authentication token. Returns the user and the token plaintext.
pub async fn user_with_token(
    state: &AppState,
    email: &str,
    activated: bool,
    permissions: &[&str],
) -> (User, String) {
    let mut user = state
        .stores
        .users
        .insert(&NewUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: hash_password(PASSWORD).expect("hashing should succeed"),
        })
        .await
        .expect("user creation should succeed");

    if activated {
        user.activated = true;
        state
            .stores
            .users
            .update(&mut user)
            .await
            .expect("activation should succeed");
    }

    state
        .stores
        .permissions
        .add_for_user(user.id, permissions)
        .await
        .expect("granting permissions should succeed");

    let token = state
        .stores
        .tokens
        .new_token(user.id, chrono::Duration::hours(1), Scope::Authentication)
        .await
        .expect("token creation should succeed");

    (user, token.plaintext)
}

/// An activated user holding both episode permissions.
pub async fn writer(state: &AppState) -> String {
    let (_, token) = user_with_token(
        state,
        "writer@example.com",
        true,
        &["episodes:read", "episodes:write"],
    )
    .await;
    token
}

pub fn episode_body(title: &str) -> Value {
    serde_json::json!({
        "title": title,
        "year": 2004,
        "runtime": "42 mins",
        "characters": ["Jack", "Kate"],
    })
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("router is infallible")
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, None, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, Some(token), None)).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, request(Method::POST, uri, None, Some(body))).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    send(app, request(Method::POST, uri, Some(token), Some(body))).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, request(Method::PUT, uri, None, Some(body))).await
}

pub async fn patch_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    send(app, request(Method::PATCH, uri, Some(token), Some(body))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::DELETE, uri, Some(token), None)).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
