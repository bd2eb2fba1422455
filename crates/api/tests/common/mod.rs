#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use yamdb_api::auth::jwt::{generate_access_token, JwtConfig};
use yamdb_api::config::ServerConfig;
use yamdb_api::router::build_app_router;
use yamdb_api::state::AppState;
use yamdb_core::confirmation::ConfirmationCodeGenerator;
use yamdb_core::roles::Role;
use yamdb_db::models::user::{CreateUser, User};
use yamdb_db::repositories::UserRepo;
use yamdb_mail::MemoryMailer;

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 60,
        },
        confirmation_code_length: 24,
        superuser: None,
    }
}

/// Build the full application router over `pool` with an in-memory mailer.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_mailer(pool).0
}

/// Like [`build_test_app`], also returning the mailer so tests can read
/// the confirmation codes that were "sent".
pub fn build_test_app_with_mailer(pool: PgPool) -> (Router, Arc<MemoryMailer>) {
    let config = test_config();
    let mailer = Arc::new(MemoryMailer::new());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        mailer: mailer.clone(),
        codes: Arc::new(ConfirmationCodeGenerator::default()),
    };

    (build_app_router(state, &config), mailer)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user with `role` and return it with a valid access token.
pub async fn create_user(pool: &PgPool, username: &str, role: Role) -> (User, String) {
    let input = CreateUser {
        role,
        ..CreateUser::new(username, format!("{username}@test.com"))
    };
    let user = UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed");
    let token = generate_access_token(user.id, &user.username, &test_config().jwt)
        .expect("token generation should succeed");
    (user, token)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn patch_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::PATCH, uri, None, Some(body)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None, None).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// The confirmation code in the latest message sent to `email`.
pub fn sent_code(mailer: &MemoryMailer, email: &str) -> String {
    let message = mailer.last_to(email).expect("a message should have been sent");
    message
        .body
        .lines()
        .find_map(|line| line.strip_prefix("Your confirmation code is: "))
        .expect("message should contain a code")
        .trim()
        .to_string()
}
