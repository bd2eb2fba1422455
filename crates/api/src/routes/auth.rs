//! Route definitions for the `/auth` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// ```text
/// POST /auth/signup/  -> signup (public)
/// POST /auth/token/   -> token (public)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup/", post(auth::signup))
        .route("/auth/token/", post(auth::token))
}
