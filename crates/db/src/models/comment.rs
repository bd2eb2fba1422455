//! Comment entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use yamdb_core::types::{DbId, Timestamp};

/// A comment joined with its author's username.
///
/// Serializes as `{id, text, author, pub_date}`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub id: DbId,
    #[serde(skip_serializing)]
    pub review_id: DbId,
    #[serde(skip_serializing)]
    pub author_id: DbId,
    /// Author username.
    pub author: String,
    pub text: String,
    pub pub_date: Timestamp,
}

/// DTO for creating a new comment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub review_id: DbId,
    pub author_id: DbId,
    pub text: String,
}

/// DTO for updating a comment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateComment {
    pub text: Option<String>,
}
