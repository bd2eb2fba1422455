//! Handlers for the `/categories` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use yamdb_core::error::CoreError;
use yamdb_db::models::category::{Category, CreateCategory};
use yamdb_db::repositories::CategoryRepo;

use super::slugged::NameSlugRequest;
use crate::error::AppResult;
use crate::middleware::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::rbac::{Categories, Permit};
use crate::query::SearchParams;
use crate::response::Page;
use crate::state::AppState;

/// GET /api/v1/categories/
pub async fn list_categories(
    _permit: Permit<Categories>,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> AppResult<Json<Page<Category>>> {
    let page = params.page();
    let search = params.term();
    let count = CategoryRepo::count(&state.pool, search).await?;
    let results = CategoryRepo::list(&state.pool, search, page.limit(), page.offset()).await?;
    Ok(Json(Page::new(count, results)))
}

/// POST /api/v1/categories/
pub async fn create_category(
    permit: Permit<Categories>,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NameSlugRequest>,
) -> AppResult<impl IntoResponse> {
    let (name, slug) = input.into_valid()?;

    if CategoryRepo::find_by_slug(&state.pool, &slug).await?.is_some() {
        return Err(CoreError::field("slug", "A category with this slug already exists.").into());
    }

    let category = CategoryRepo::create(&state.pool, &CreateCategory { name, slug }).await?;

    tracing::info!(
        slug = %category.slug,
        user_id = permit.user().map(|u| u.user_id),
        "Category created",
    );

    Ok((StatusCode::CREATED, Json(category)))
}

/// DELETE /api/v1/categories/{slug}/
///
/// Titles in the category are deleted with it.
pub async fn delete_category(
    permit: Permit<Categories>,
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> AppResult<StatusCode> {
    if !CategoryRepo::delete_by_slug(&state.pool, &slug).await? {
        return Err(CoreError::not_found("Category", slug).into());
    }

    tracing::info!(slug = %slug, user_id = permit.user().map(|u| u.user_id), "Category deleted");

    Ok(StatusCode::NO_CONTENT)
}
