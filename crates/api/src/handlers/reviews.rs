//! Handlers for `/titles/{title_id}/reviews`.
//!
//! Anyone may read. Any authenticated user may post one review per title;
//! the author, moderators and admins may edit or delete it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;
use yamdb_core::error::CoreError;
use yamdb_core::types::DbId;
use yamdb_core::validation::{finish, required, validate_request, MAX_SCORE, MIN_SCORE};
use yamdb_db::models::review::{CreateReview, Review, UpdateReview};
use yamdb_db::repositories::{ReviewRepo, TitleRepo};

use crate::error::AppResult;
use crate::middleware::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::rbac::{Permit, Reviews};
use crate::query::PaginationParams;
use crate::response::Page;
use crate::state::AppState;

pub const ALREADY_REVIEWED: &str = "You have already reviewed this title.";

/// Body for creating or editing a review.
#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: Option<String>,
    #[validate(range(
        min = MIN_SCORE,
        max = MAX_SCORE,
        message = "Score must be between 1 and 10."
    ))]
    pub score: Option<i16>,
}

async fn ensure_title(state: &AppState, title_id: DbId) -> AppResult<()> {
    if TitleRepo::exists(&state.pool, title_id).await? {
        Ok(())
    } else {
        Err(CoreError::not_found("Title", title_id).into())
    }
}

async fn load_review(state: &AppState, title_id: DbId, review_id: DbId) -> AppResult<Review> {
    ReviewRepo::find_in_title(&state.pool, title_id, review_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Review", review_id).into())
}

/// GET /api/v1/titles/{title_id}/reviews/
pub async fn list_reviews(
    _permit: Permit<Reviews>,
    State(state): State<AppState>,
    ApiPath(title_id): ApiPath<DbId>,
    ApiQuery(page): ApiQuery<PaginationParams>,
) -> AppResult<Json<Page<Review>>> {
    ensure_title(&state, title_id).await?;
    let count = ReviewRepo::count_for_title(&state.pool, title_id).await?;
    let results =
        ReviewRepo::list_for_title(&state.pool, title_id, page.limit(), page.offset()).await?;
    Ok(Json(Page::new(count, results)))
}

/// POST /api/v1/titles/{title_id}/reviews/
pub async fn create_review(
    permit: Permit<Reviews>,
    State(state): State<AppState>,
    ApiPath(title_id): ApiPath<DbId>,
    ApiJson(input): ApiJson<ReviewRequest>,
) -> AppResult<impl IntoResponse> {
    let author = permit.require_user()?;
    ensure_title(&state, title_id).await?;

    let mut errors = validate_request(&input);
    let text = required(&mut errors, "text", input.text);
    let score = required(&mut errors, "score", input.score);
    let (text, score) = match (text, score) {
        (Some(text), Some(score)) if errors.is_empty() => (text, score),
        _ => return Err(CoreError::InvalidFields(errors).into()),
    };

    // The unique constraint is authoritative; this only gives a clean message.
    if ReviewRepo::exists_for_author(&state.pool, title_id, author.user_id).await? {
        return Err(CoreError::field("non_field_errors", ALREADY_REVIEWED).into());
    }

    let review = ReviewRepo::create(
        &state.pool,
        &CreateReview {
            title_id,
            author_id: author.user_id,
            text,
            score,
        },
    )
    .await?;

    tracing::info!(review_id = review.id, title_id, user_id = author.user_id, "Review created");

    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /api/v1/titles/{title_id}/reviews/{review_id}/
pub async fn get_review(
    _permit: Permit<Reviews>,
    State(state): State<AppState>,
    ApiPath((title_id, review_id)): ApiPath<(DbId, DbId)>,
) -> AppResult<Json<Review>> {
    Ok(Json(load_review(&state, title_id, review_id).await?))
}

/// PATCH /api/v1/titles/{title_id}/reviews/{review_id}/
pub async fn update_review(
    permit: Permit<Reviews>,
    State(state): State<AppState>,
    ApiPath((title_id, review_id)): ApiPath<(DbId, DbId)>,
    ApiJson(input): ApiJson<ReviewRequest>,
) -> AppResult<Json<Review>> {
    let review = load_review(&state, title_id, review_id).await?;
    permit.check_owner(review.author_id)?;

    finish(validate_request(&input))?;

    let updated = ReviewRepo::update(
        &state.pool,
        review.id,
        &UpdateReview {
            text: input.text,
            score: input.score,
        },
    )
    .await?
    .ok_or_else(|| CoreError::not_found("Review", review_id))?;

    tracing::info!(
        review_id,
        title_id,
        user_id = permit.user().map(|u| u.user_id),
        "Review updated",
    );

    Ok(Json(updated))
}

/// DELETE /api/v1/titles/{title_id}/reviews/{review_id}/
pub async fn delete_review(
    permit: Permit<Reviews>,
    State(state): State<AppState>,
    ApiPath((title_id, review_id)): ApiPath<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let review = load_review(&state, title_id, review_id).await?;
    permit.check_owner(review.author_id)?;

    ReviewRepo::delete(&state.pool, review.id).await?;

    tracing::info!(
        review_id,
        title_id,
        user_id = permit.user().map(|u| u.user_id),
        "Review deleted",
    );

    Ok(StatusCode::NO_CONTENT)
}
