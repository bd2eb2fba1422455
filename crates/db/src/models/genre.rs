//! Genre model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use yamdb_core::types::{DbId, Timestamp};

/// A row from the `genres` table. Serializes as `{name, slug}`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Genre {
    #[serde(skip_serializing)]
    pub id: DbId,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing)]
    pub created_at: Timestamp,
    #[serde(skip_serializing)]
    pub updated_at: Timestamp,
}

/// DTO for creating a new genre.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGenre {
    pub name: String,
    pub slug: String,
}
