//! Route definitions for the `/titles` resource.
//!
//! Reviews and comments only exist under a title, so their routes live here.

use axum::routing::get;
use axum::Router;

use crate::handlers::{comments, reviews, titles};
use crate::state::AppState;

/// ```text
/// GET    /titles/                                   -> list_titles
/// POST   /titles/                                   -> create_title
/// GET    /titles/{title_id}/                        -> get_title
/// PATCH  /titles/{title_id}/                        -> update_title
/// DELETE /titles/{title_id}/                        -> delete_title
///
/// GET    /titles/{title_id}/reviews/                -> list_reviews
/// POST   /titles/{title_id}/reviews/                -> create_review
/// GET    /titles/{title_id}/reviews/{review_id}/    -> get_review
/// PATCH  /titles/{title_id}/reviews/{review_id}/    -> update_review
/// DELETE /titles/{title_id}/reviews/{review_id}/    -> delete_review
///
/// GET    .../reviews/{review_id}/comments/                -> list_comments
/// POST   .../reviews/{review_id}/comments/                -> create_comment
/// GET    .../reviews/{review_id}/comments/{comment_id}/   -> get_comment
/// PATCH  .../reviews/{review_id}/comments/{comment_id}/   -> update_comment
/// DELETE .../reviews/{review_id}/comments/{comment_id}/   -> delete_comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/titles/", get(titles::list_titles).post(titles::create_title))
        .route(
            "/titles/{title_id}/",
            get(titles::get_title)
                .patch(titles::update_title)
                .delete(titles::delete_title),
        )
        .route(
            "/titles/{title_id}/reviews/",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/",
            get(reviews::get_review)
                .patch(reviews::update_review)
                .delete(reviews::delete_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}/",
            get(comments::get_comment)
                .patch(comments::update_comment)
                .delete(comments::delete_comment),
        )
}
