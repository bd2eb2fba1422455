//! Repository for the `reviews` table.
//!
//! Every read joins `users` so the row carries the author's username.

use sqlx::PgPool;
use yamdb_core::types::DbId;

use crate::models::review::{CreateReview, Review, UpdateReview};

/// Joined projection over `reviews r` and `users u`.
const SELECT_JOINED: &str = "SELECT r.id, r.title_id, r.author_id, u.username AS author, \
        r.text, r.score, r.pub_date \
     FROM reviews r \
     JOIN users u ON u.id = r.author_id";

/// Columns returned by `INSERT`/`UPDATE ... RETURNING` before the author join.
const RETURNING: &str = "id, title_id, author_id, text, score, pub_date";

/// Provides CRUD operations for reviews, always scoped to their title.
pub struct ReviewRepo;

impl ReviewRepo {
    /// Insert a review and return it with the author's username.
    ///
    /// A second review by the same author on the same title fails with the
    /// `uq_reviews_author_title` unique violation.
    pub async fn create(pool: &PgPool, input: &CreateReview) -> Result<Review, sqlx::Error> {
        let query = format!(
            "WITH inserted AS (
                INSERT INTO reviews (title_id, author_id, text, score)
                VALUES ($1, $2, $3, $4)
                RETURNING {RETURNING}
             )
             SELECT i.id, i.title_id, i.author_id, u.username AS author,
                    i.text, i.score, i.pub_date
             FROM inserted i
             JOIN users u ON u.id = i.author_id"
        );
        sqlx::query_as::<_, Review>(&query)
            .bind(input.title_id)
            .bind(input.author_id)
            .bind(&input.text)
            .bind(input.score)
            .fetch_one(pool)
            .await
    }

    /// Find a review by ID, only if it belongs to `title_id`.
    pub async fn find_in_title(
        pool: &PgPool,
        title_id: DbId,
        id: DbId,
    ) -> Result<Option<Review>, sqlx::Error> {
        let query = format!("{SELECT_JOINED} WHERE r.title_id = $1 AND r.id = $2");
        sqlx::query_as::<_, Review>(&query)
            .bind(title_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the reviews of a title, oldest first.
    pub async fn list_for_title(
        pool: &PgPool,
        title_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Review>, sqlx::Error> {
        let query = format!(
            "{SELECT_JOINED} WHERE r.title_id = $1
             ORDER BY r.pub_date ASC, r.id ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Review>(&query)
            .bind(title_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_for_title(pool: &PgPool, title_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE title_id = $1")
            .bind(title_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// `true` if `author_id` has already reviewed `title_id`.
    pub async fn exists_for_author(
        pool: &PgPool,
        title_id: DbId,
        author_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE title_id = $1 AND author_id = $2)",
        )
        .bind(title_id)
        .bind(author_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// Update text and/or score. Title and author never change.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateReview,
    ) -> Result<Option<Review>, sqlx::Error> {
        let query = format!(
            "WITH updated AS (
                UPDATE reviews SET
                    text = COALESCE($2, text),
                    score = COALESCE($3, score)
                WHERE id = $1
                RETURNING {RETURNING}
             )
             SELECT d.id, d.title_id, d.author_id, u.username AS author,
                    d.text, d.score, d.pub_date
             FROM updated d
             JOIN users u ON u.id = d.author_id"
        );
        sqlx::query_as::<_, Review>(&query)
            .bind(id)
            .bind(&input.text)
            .bind(input.score)
            .fetch_optional(pool)
            .await
    }

    /// Delete a review. Its comments cascade. Returns `true` if deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
