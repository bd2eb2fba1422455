//! Route definitions for the `/users` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// ```text
/// GET    /users/             -> list_users (admin)
/// POST   /users/             -> create_user (admin)
/// GET    /users/me/          -> get_me (authenticated)
/// PATCH  /users/me/          -> update_me (authenticated)
/// GET    /users/{username}/  -> get_user (admin)
/// PATCH  /users/{username}/  -> update_user (admin)
/// DELETE /users/{username}/  -> delete_user (admin)
/// ```
///
/// The static `me` segment takes precedence over `{username}`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/", get(users::list_users).post(users::create_user))
        .route("/users/me/", get(users::get_me).patch(users::update_me))
        .route(
            "/users/{username}/",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
}
