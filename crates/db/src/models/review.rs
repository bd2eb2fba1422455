//! Review entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use yamdb_core::types::{DbId, Timestamp};

/// A review joined with its author's username.
///
/// Serializes as `{id, text, author, score, pub_date}`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
    pub id: DbId,
    #[serde(skip_serializing)]
    pub title_id: DbId,
    #[serde(skip_serializing)]
    pub author_id: DbId,
    /// Author username.
    pub author: String,
    pub text: String,
    pub score: i16,
    pub pub_date: Timestamp,
}

/// DTO for creating a new review.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReview {
    pub title_id: DbId,
    pub author_id: DbId,
    pub text: String,
    pub score: i16,
}

/// DTO for updating a review. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReview {
    pub text: Option<String>,
    pub score: Option<i16>,
}
