//! Category model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use yamdb_core::types::{DbId, Timestamp};

/// A row from the `categories` table. Serializes as `{name, slug}`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    #[serde(skip_serializing)]
    pub id: DbId,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing)]
    pub created_at: Timestamp,
    #[serde(skip_serializing)]
    pub updated_at: Timestamp,
}

/// DTO for creating a new category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub slug: String,
}
