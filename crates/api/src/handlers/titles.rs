//! Handlers for the `/titles` resource.
//!
//! Reads return the nested representation with the computed `rating`;
//! writes accept and return genre/category slugs.

use std::collections::{BTreeSet, HashMap};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;
use yamdb_core::error::{CoreError, FieldErrors};
use yamdb_core::rating::rating_from_totals;
use yamdb_core::types::DbId;
use yamdb_core::validation::{
    check_year, current_year, finish, push, required, validate_request, MAX_NAME_LENGTH,
};
use yamdb_db::models::title::{CreateTitle, TitleFilter, TitleGenre, TitleWithStats, UpdateTitle};
use yamdb_db::repositories::{CategoryRepo, GenreRepo, TitleRepo};

use crate::error::AppResult;
use crate::middleware::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::rbac::{Permit, Titles};
use crate::query::PaginationParams;
use crate::response::Page;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Representations
// ---------------------------------------------------------------------------

/// `{name, slug}` of a genre or category nested in a title.
#[derive(Debug, Serialize)]
pub struct NameSlug {
    pub name: String,
    pub slug: String,
}

/// Read representation of a title.
#[derive(Debug, Serialize)]
pub struct TitleRead {
    pub id: DbId,
    pub name: String,
    pub year: i32,
    /// Rounded mean review score; `null` without reviews.
    pub rating: Option<i32>,
    pub description: String,
    pub genre: Vec<NameSlug>,
    pub category: NameSlug,
}

impl TitleRead {
    fn new(stats: TitleWithStats, genres: Vec<TitleGenre>) -> Self {
        Self {
            id: stats.id,
            name: stats.name,
            year: stats.year,
            rating: rating_from_totals(stats.score_sum, stats.review_count),
            description: stats.description,
            genre: genres
                .into_iter()
                .map(|g| NameSlug {
                    name: g.name,
                    slug: g.slug,
                })
                .collect(),
            category: NameSlug {
                name: stats.category_name,
                slug: stats.category_slug,
            },
        }
    }
}

/// Write representation of a title, referencing genres and category by slug.
#[derive(Debug, Serialize)]
pub struct TitleWritten {
    pub id: DbId,
    pub name: String,
    pub year: i32,
    pub description: String,
    pub genre: Vec<String>,
    pub category: String,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Query parameters for `GET /titles/`.
#[derive(Debug, Default, Deserialize)]
pub struct TitleListParams {
    pub genre: Option<String>,
    pub category: Option<String>,
    pub name: Option<String>,
    pub year: Option<i32>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Body for `POST /titles/` and `PATCH /titles/{id}/`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TitleWriteRequest {
    #[validate(length(
        min = 1,
        max = MAX_NAME_LENGTH,
        message = "Name must be between 1 and 256 characters."
    ))]
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    /// Genre slugs.
    pub genre: Option<Vec<String>>,
    /// Category slug.
    pub category: Option<String>,
}

/// A [`TitleWriteRequest`] with slugs resolved to ids.
#[derive(Debug)]
struct ResolvedWrite {
    name: Option<String>,
    year: Option<i32>,
    description: Option<String>,
    category_id: Option<DbId>,
    genre_ids: Option<Vec<DbId>>,
}

impl TitleWriteRequest {
    /// Validate fields and resolve slugs. `creating` makes `name`, `year` and
    /// `category` required.
    async fn resolve(self, pool: &PgPool, creating: bool) -> AppResult<ResolvedWrite> {
        let mut errors: FieldErrors = validate_request(&self);

        let (name, year, category) = if creating {
            (
                required(&mut errors, "name", self.name),
                required(&mut errors, "year", self.year),
                required(&mut errors, "category", self.category),
            )
        } else {
            (self.name, self.year, self.category)
        };

        if let Some(year) = year {
            check_year(&mut errors, year, current_year());
        }

        let mut category_id = None;
        if let Some(slug) = &category {
            match CategoryRepo::find_by_slug(pool, slug).await? {
                Some(found) => category_id = Some(found.id),
                None => push(
                    &mut errors,
                    "category",
                    format!("Category with slug \"{slug}\" does not exist."),
                ),
            }
        }

        let mut genre_ids = None;
        if let Some(slugs) = self.genre {
            let wanted: BTreeSet<String> = slugs.into_iter().collect();
            let wanted: Vec<String> = wanted.into_iter().collect();
            let found = GenreRepo::find_by_slugs(pool, &wanted).await?;
            for slug in &wanted {
                if !found.iter().any(|g| &g.slug == slug) {
                    push(
                        &mut errors,
                        "genre",
                        format!("Genre with slug \"{slug}\" does not exist."),
                    );
                }
            }
            genre_ids = Some(found.into_iter().map(|g| g.id).collect());
        }

        finish(errors)?;

        Ok(ResolvedWrite {
            name,
            year,
            description: self.description,
            category_id,
            genre_ids,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_read(pool: &PgPool, id: DbId) -> AppResult<TitleRead> {
    let stats = TitleRepo::find_with_stats(pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Title", id))?;
    let genres = TitleRepo::genres_for_titles(pool, &[id]).await?;
    Ok(TitleRead::new(stats, genres))
}

async fn load_written(pool: &PgPool, id: DbId) -> AppResult<TitleWritten> {
    let stats = TitleRepo::find_with_stats(pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Title", id))?;
    let genres = TitleRepo::genres_for_titles(pool, &[id]).await?;
    Ok(TitleWritten {
        id: stats.id,
        name: stats.name,
        year: stats.year,
        description: stats.description,
        genre: genres.into_iter().map(|g| g.slug).collect(),
        category: stats.category_slug,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/titles/
///
/// Filters: `genre` and `category` slugs, `name` substring, exact `year`.
pub async fn list_titles(
    _permit: Permit<Titles>,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<TitleListParams>,
) -> AppResult<Json<Page<TitleRead>>> {
    let page = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let filter = TitleFilter {
        genre: params.genre,
        category: params.category,
        name: params.name,
        year: params.year,
    };

    let count = TitleRepo::count(&state.pool, &filter).await?;
    let rows =
        TitleRepo::list_with_stats(&state.pool, &filter, page.limit(), page.offset()).await?;

    let ids: Vec<DbId> = rows.iter().map(|t| t.id).collect();
    let mut genres_by_title: HashMap<DbId, Vec<TitleGenre>> = HashMap::new();
    for genre in TitleRepo::genres_for_titles(&state.pool, &ids).await? {
        genres_by_title.entry(genre.title_id).or_default().push(genre);
    }

    let results = rows
        .into_iter()
        .map(|stats| {
            let genres = genres_by_title.remove(&stats.id).unwrap_or_default();
            TitleRead::new(stats, genres)
        })
        .collect();

    Ok(Json(Page::new(count, results)))
}

/// POST /api/v1/titles/
pub async fn create_title(
    permit: Permit<Titles>,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<TitleWriteRequest>,
) -> AppResult<impl IntoResponse> {
    let resolved = input.resolve(&state.pool, true).await?;

    let (Some(name), Some(year), Some(category_id)) =
        (resolved.name, resolved.year, resolved.category_id)
    else {
        return Err(CoreError::Validation("name, year and category are required".into()).into());
    };

    let title = TitleRepo::create(
        &state.pool,
        &CreateTitle {
            name,
            year,
            description: resolved.description.unwrap_or_default(),
            category_id,
            genre_ids: resolved.genre_ids.unwrap_or_default(),
        },
    )
    .await?;

    tracing::info!(
        title_id = title.id,
        user_id = permit.user().map(|u| u.user_id),
        "Title created",
    );

    let body = load_written(&state.pool, title.id).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /api/v1/titles/{title_id}/
pub async fn get_title(
    _permit: Permit<Titles>,
    State(state): State<AppState>,
    ApiPath(title_id): ApiPath<DbId>,
) -> AppResult<Json<TitleRead>> {
    Ok(Json(load_read(&state.pool, title_id).await?))
}

/// PATCH /api/v1/titles/{title_id}/
///
/// Partial update; a `genre` list replaces all associations.
pub async fn update_title(
    permit: Permit<Titles>,
    State(state): State<AppState>,
    ApiPath(title_id): ApiPath<DbId>,
    ApiJson(input): ApiJson<TitleWriteRequest>,
) -> AppResult<Json<TitleWritten>> {
    if !TitleRepo::exists(&state.pool, title_id).await? {
        return Err(CoreError::not_found("Title", title_id).into());
    }

    let resolved = input.resolve(&state.pool, false).await?;

    TitleRepo::update(
        &state.pool,
        title_id,
        &UpdateTitle {
            name: resolved.name,
            year: resolved.year,
            description: resolved.description,
            category_id: resolved.category_id,
            genre_ids: resolved.genre_ids,
        },
    )
    .await?
    .ok_or_else(|| CoreError::not_found("Title", title_id))?;

    tracing::info!(title_id, user_id = permit.user().map(|u| u.user_id), "Title updated");

    Ok(Json(load_written(&state.pool, title_id).await?))
}

/// DELETE /api/v1/titles/{title_id}/
///
/// Reviews and their comments are deleted with the title.
pub async fn delete_title(
    permit: Permit<Titles>,
    State(state): State<AppState>,
    ApiPath(title_id): ApiPath<DbId>,
) -> AppResult<StatusCode> {
    if !TitleRepo::delete(&state.pool, title_id).await? {
        return Err(CoreError::not_found("Title", title_id).into());
    }

    tracing::info!(title_id, user_id = permit.user().map(|u| u.user_id), "Title deleted");

    Ok(StatusCode::NO_CONTENT)
}
