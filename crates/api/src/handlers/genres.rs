//! Handlers for the `/genres` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use yamdb_core::error::CoreError;
use yamdb_db::models::genre::{CreateGenre, Genre};
use yamdb_db::repositories::GenreRepo;

use super::slugged::NameSlugRequest;
use crate::error::AppResult;
use crate::middleware::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::rbac::{Genres, Permit};
use crate::query::SearchParams;
use crate::response::Page;
use crate::state::AppState;

/// GET /api/v1/genres/
pub async fn list_genres(
    _permit: Permit<Genres>,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> AppResult<Json<Page<Genre>>> {
    let page = params.page();
    let search = params.term();
    let count = GenreRepo::count(&state.pool, search).await?;
    let results = GenreRepo::list(&state.pool, search, page.limit(), page.offset()).await?;
    Ok(Json(Page::new(count, results)))
}

/// POST /api/v1/genres/
pub async fn create_genre(
    permit: Permit<Genres>,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NameSlugRequest>,
) -> AppResult<impl IntoResponse> {
    let (name, slug) = input.into_valid()?;

    if GenreRepo::find_by_slug(&state.pool, &slug).await?.is_some() {
        return Err(CoreError::field("slug", "A genre with this slug already exists.").into());
    }

    let genre = GenreRepo::create(&state.pool, &CreateGenre { name, slug }).await?;

    tracing::info!(
        slug = %genre.slug,
        user_id = permit.user().map(|u| u.user_id),
        "Genre created",
    );

    Ok((StatusCode::CREATED, Json(genre)))
}

/// DELETE /api/v1/genres/{slug}/
///
/// Titles keep existing; only their association with the genre is removed.
pub async fn delete_genre(
    permit: Permit<Genres>,
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> AppResult<StatusCode> {
    if !GenreRepo::delete_by_slug(&state.pool, &slug).await? {
        return Err(CoreError::not_found("Genre", slug).into());
    }

    tracing::info!(slug = %slug, user_id = permit.user().map(|u| u.user_id), "Genre deleted");

    Ok(StatusCode::NO_CONTENT)
}
