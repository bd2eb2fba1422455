//! Route definitions for the `/genres` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::genres;
use crate::state::AppState;

/// ```text
/// GET    /genres/         -> list_genres
/// POST   /genres/         -> create_genre
/// DELETE /genres/{slug}/  -> delete_genre
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/genres/",
            get(genres::list_genres).post(genres::create_genre),
        )
        .route("/genres/{slug}/", delete(genres::delete_genre))
}
