//! Repository for the `comments` table.

use sqlx::PgPool;
use yamdb_core::types::DbId;

use crate::models::comment::{Comment, CreateComment, UpdateComment};

const SELECT_JOINED: &str = "SELECT c.id, c.review_id, c.author_id, u.username AS author, \
        c.text, c.pub_date \
     FROM comments c \
     JOIN users u ON u.id = c.author_id";

/// Provides CRUD operations for comments, always scoped to their review.
pub struct CommentRepo;

impl CommentRepo {
    /// Insert a comment and return it with the author's username.
    pub async fn create(pool: &PgPool, input: &CreateComment) -> Result<Comment, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            "WITH inserted AS (
                INSERT INTO comments (review_id, author_id, text)
                VALUES ($1, $2, $3)
                RETURNING id, review_id, author_id, text, pub_date
             )
             SELECT i.id, i.review_id, i.author_id, u.username AS author,
                    i.text, i.pub_date
             FROM inserted i
             JOIN users u ON u.id = i.author_id",
        )
        .bind(input.review_id)
        .bind(input.author_id)
        .bind(&input.text)
        .fetch_one(pool)
        .await
    }

    /// Find a comment by ID, only if it belongs to `review_id`.
    pub async fn find_in_review(
        pool: &PgPool,
        review_id: DbId,
        id: DbId,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("{SELECT_JOINED} WHERE c.review_id = $1 AND c.id = $2");
        sqlx::query_as::<_, Comment>(&query)
            .bind(review_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the comments of a review, oldest first.
    pub async fn list_for_review(
        pool: &PgPool,
        review_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, sqlx::Error> {
        let query = format!(
            "{SELECT_JOINED} WHERE c.review_id = $1
             ORDER BY c.pub_date ASC, c.id ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(review_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_for_review(pool: &PgPool, review_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM comments WHERE review_id = $1")
                .bind(review_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    /// Update the comment text. Returns `None` if the row does not exist.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateComment,
    ) -> Result<Option<Comment>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            "WITH updated AS (
                UPDATE comments SET text = COALESCE($2, text)
                WHERE id = $1
                RETURNING id, review_id, author_id, text, pub_date
             )
             SELECT d.id, d.review_id, d.author_id, u.username AS author,
                    d.text, d.pub_date
             FROM updated d
             JOIN users u ON u.id = d.author_id",
        )
        .bind(id)
        .bind(&input.text)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
