//! Repository for the `genres` table.

use sqlx::PgPool;

use crate::models::genre::{CreateGenre, Genre};

/// Column list for genres queries.
const COLUMNS: &str = "id, name, slug, created_at, updated_at";

/// Provides list/create/delete operations for genres, keyed by slug.
pub struct GenreRepo;

impl GenreRepo {
    /// List genres ordered by name, optionally filtered by a name substring.
    pub async fn list(
        pool: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Genre>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM genres
             WHERE ($1::TEXT IS NULL OR name ILIKE '%' || $1 || '%')
             ORDER BY name ASC, id ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Genre>(&query)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count genres matching the same filter as [`GenreRepo::list`].
    pub async fn count(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM genres
             WHERE ($1::TEXT IS NULL OR name ILIKE '%' || $1 || '%')",
        )
        .bind(search)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Find a genre by its slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Genre>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM genres WHERE slug = $1");
        sqlx::query_as::<_, Genre>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Fetch every genre whose slug is in `slugs`. Unknown slugs are simply absent.
    pub async fn find_by_slugs(pool: &PgPool, slugs: &[String]) -> Result<Vec<Genre>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM genres WHERE slug = ANY($1) ORDER BY name");
        sqlx::query_as::<_, Genre>(&query)
            .bind(slugs)
            .fetch_all(pool)
            .await
    }

    /// Create a new genre, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateGenre) -> Result<Genre, sqlx::Error> {
        let query = format!(
            "INSERT INTO genres (name, slug)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Genre>(&query)
            .bind(&input.name)
            .bind(&input.slug)
            .fetch_one(pool)
            .await
    }

    /// Delete a genre by slug. Title associations cascade. Returns `true` if deleted.
    pub async fn delete_by_slug(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM genres WHERE slug = $1")
            .bind(slug)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
