pub mod auth;
pub mod categories;
pub mod genres;
pub mod health;
pub mod titles;
pub mod users;

use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/signup/                                      signup (public)
/// /auth/token/                                       token exchange (public)
///
/// /categories/                                       list, create
/// /categories/{slug}/                                delete
/// /genres/                                           list, create
/// /genres/{slug}/                                    delete
///
/// /titles/                                           list, create
/// /titles/{title_id}/                                get, update, delete
/// /titles/{title_id}/reviews/                        list, create
/// /titles/{title_id}/reviews/{review_id}/            get, update, delete
/// /titles/{title_id}/reviews/{review_id}/comments/   list, create
/// /titles/{title_id}/reviews/{review_id}/comments/{comment_id}/
///                                                    get, update, delete
///
/// /users/                                            list, create (admin)
/// /users/me/                                         get, update (self)
/// /users/{username}/                                 get, update, delete (admin)
/// ```
///
/// Any other method on one of these paths gets a 405 error envelope.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(categories::router())
        .merge(genres::router())
        .merge(titles::router())
        .merge(users::router())
        // Must come after every route it should cover.
        .method_not_allowed_fallback(|| async { AppError::MethodNotAllowed })
}
