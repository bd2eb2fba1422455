//! Handlers for `/titles/{title_id}/reviews/{review_id}/comments`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;
use yamdb_core::error::CoreError;
use yamdb_core::types::DbId;
use yamdb_core::validation::{finish, required, validate_request};
use yamdb_db::models::comment::{Comment, CreateComment, UpdateComment};
use yamdb_db::models::review::Review;
use yamdb_db::repositories::{CommentRepo, ReviewRepo};

use crate::error::AppResult;
use crate::middleware::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::rbac::{Comments, Permit};
use crate::query::PaginationParams;
use crate::response::Page;
use crate::state::AppState;

/// Body for creating or editing a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: Option<String>,
}

/// The parent review, which must belong to the title in the path.
async fn load_review(state: &AppState, title_id: DbId, review_id: DbId) -> AppResult<Review> {
    ReviewRepo::find_in_title(&state.pool, title_id, review_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Review", review_id).into())
}

async fn load_comment(
    state: &AppState,
    title_id: DbId,
    review_id: DbId,
    comment_id: DbId,
) -> AppResult<Comment> {
    let review = load_review(state, title_id, review_id).await?;
    CommentRepo::find_in_review(&state.pool, review.id, comment_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Comment", comment_id).into())
}

/// GET /api/v1/titles/{title_id}/reviews/{review_id}/comments/
pub async fn list_comments(
    _permit: Permit<Comments>,
    State(state): State<AppState>,
    ApiPath((title_id, review_id)): ApiPath<(DbId, DbId)>,
    ApiQuery(page): ApiQuery<PaginationParams>,
) -> AppResult<Json<Page<Comment>>> {
    let review = load_review(&state, title_id, review_id).await?;
    let count = CommentRepo::count_for_review(&state.pool, review.id).await?;
    let results =
        CommentRepo::list_for_review(&state.pool, review.id, page.limit(), page.offset()).await?;
    Ok(Json(Page::new(count, results)))
}

/// POST /api/v1/titles/{title_id}/reviews/{review_id}/comments/
pub async fn create_comment(
    permit: Permit<Comments>,
    State(state): State<AppState>,
    ApiPath((title_id, review_id)): ApiPath<(DbId, DbId)>,
    ApiJson(input): ApiJson<CommentRequest>,
) -> AppResult<impl IntoResponse> {
    let author = permit.require_user()?;
    let review = load_review(&state, title_id, review_id).await?;

    let mut errors = validate_request(&input);
    let text = match required(&mut errors, "text", input.text) {
        Some(text) if errors.is_empty() => text,
        _ => return Err(CoreError::InvalidFields(errors).into()),
    };

    let comment = CommentRepo::create(
        &state.pool,
        &CreateComment {
            review_id: review.id,
            author_id: author.user_id,
            text,
        },
    )
    .await?;

    tracing::info!(
        comment_id = comment.id,
        review_id,
        user_id = author.user_id,
        "Comment created",
    );

    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}/
pub async fn get_comment(
    _permit: Permit<Comments>,
    State(state): State<AppState>,
    ApiPath((title_id, review_id, comment_id)): ApiPath<(DbId, DbId, DbId)>,
) -> AppResult<Json<Comment>> {
    Ok(Json(
        load_comment(&state, title_id, review_id, comment_id).await?,
    ))
}

/// PATCH /api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}/
pub async fn update_comment(
    permit: Permit<Comments>,
    State(state): State<AppState>,
    ApiPath((title_id, review_id, comment_id)): ApiPath<(DbId, DbId, DbId)>,
    ApiJson(input): ApiJson<CommentRequest>,
) -> AppResult<Json<Comment>> {
    let comment = load_comment(&state, title_id, review_id, comment_id).await?;
    permit.check_owner(comment.author_id)?;

    finish(validate_request(&input))?;

    let updated = CommentRepo::update(&state.pool, comment.id, &UpdateComment { text: input.text })
        .await?
        .ok_or_else(|| CoreError::not_found("Comment", comment_id))?;

    tracing::info!(comment_id, user_id = permit.user().map(|u| u.user_id), "Comment updated");

    Ok(Json(updated))
}

/// DELETE /api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}/
pub async fn delete_comment(
    permit: Permit<Comments>,
    State(state): State<AppState>,
    ApiPath((title_id, review_id, comment_id)): ApiPath<(DbId, DbId, DbId)>,
) -> AppResult<StatusCode> {
    let comment = load_comment(&state, title_id, review_id, comment_id).await?;
    permit.check_owner(comment.author_id)?;

    CommentRepo::delete(&state.pool, comment.id).await?;

    tracing::info!(comment_id, user_id = permit.user().map(|u| u.user_id), "Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}
