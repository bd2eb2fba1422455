//! Repository for the `categories` table.

use sqlx::PgPool;

use crate::models::category::{Category, CreateCategory};

/// Column list for categories queries.
const COLUMNS: &str = "id, name, slug, created_at, updated_at";

/// Provides list/create/delete operations for categories, keyed by slug.
pub struct CategoryRepo;

impl CategoryRepo {
    /// List categories ordered by name, optionally filtered by a name substring.
    pub async fn list(
        pool: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM categories
             WHERE ($1::TEXT IS NULL OR name ILIKE '%' || $1 || '%')
             ORDER BY name ASC, id ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count categories matching the same filter as [`CategoryRepo::list`].
    pub async fn count(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM categories
             WHERE ($1::TEXT IS NULL OR name ILIKE '%' || $1 || '%')",
        )
        .bind(search)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Find a category by its slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE slug = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Create a new category, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateCategory) -> Result<Category, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories (name, slug)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(&input.name)
            .bind(&input.slug)
            .fetch_one(pool)
            .await
    }

    /// Delete a category by slug. Its titles cascade. Returns `true` if deleted.
    pub async fn delete_by_slug(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE slug = $1")
            .bind(slug)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
