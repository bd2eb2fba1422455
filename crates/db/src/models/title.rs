//! Title entity model and DTOs.
//!
//! Titles belong to one category and to any number of genres through the
//! `title_genres` junction table. Reads come back as [`TitleWithStats`], which
//! carries the review totals the rating is computed from.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use yamdb_core::types::{DbId, Timestamp};

/// A row from the `titles` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Title {
    pub id: DbId,
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A title joined with its category and aggregated review totals.
#[derive(Debug, Clone, FromRow)]
pub struct TitleWithStats {
    pub id: DbId,
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category_name: String,
    pub category_slug: String,
    /// `SUM(reviews.score)`, zero when there are no reviews.
    pub score_sum: i64,
    pub review_count: i64,
}

/// One genre attached to a title (junction row joined with `genres`).
#[derive(Debug, Clone, FromRow)]
pub struct TitleGenre {
    pub title_id: DbId,
    pub name: String,
    pub slug: String,
}

/// DTO for creating a new title.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTitle {
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category_id: DbId,
    pub genre_ids: Vec<DbId>,
}

/// DTO for updating a title. `genre_ids: Some(..)` replaces all associations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTitle {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category_id: Option<DbId>,
    pub genre_ids: Option<Vec<DbId>>,
}

/// Optional list filters for `GET /titles/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleFilter {
    /// Genre slug.
    pub genre: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    /// Case-insensitive substring of the title name.
    pub name: Option<String>,
    pub year: Option<i32>,
}
