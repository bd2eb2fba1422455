//! Repository for the `titles` and `title_genres` tables.

use sqlx::{PgPool, Postgres, Transaction};
use yamdb_core::types::DbId;

use crate::models::title::{
    CreateTitle, Title, TitleFilter, TitleGenre, TitleWithStats, UpdateTitle,
};

/// Column list for the `titles` table.
const COLUMNS: &str = "id, name, year, description, category_id, created_at, updated_at";

/// Title joined with its category and review totals. Callers append
/// `WHERE`, then [`STATS_GROUP_BY`].
const STATS_SELECT: &str = "SELECT t.id, t.name, t.year, t.description, \
        c.name AS category_name, c.slug AS category_slug, \
        COALESCE(SUM(r.score), 0)::BIGINT AS score_sum, \
        COUNT(r.id) AS review_count \
     FROM titles t \
     JOIN categories c ON c.id = t.category_id \
     LEFT JOIN reviews r ON r.title_id = t.id";

const STATS_GROUP_BY: &str = "GROUP BY t.id, c.id";

/// List filter over `t`/`c`; binds `$1` genre slug, `$2` category slug,
/// `$3` name substring, `$4` year.
const FILTER_WHERE: &str = "WHERE ($1::TEXT IS NULL OR EXISTS ( \
            SELECT 1 FROM title_genres tg JOIN genres g ON g.id = tg.genre_id \
            WHERE tg.title_id = t.id AND g.slug = $1)) \
       AND ($2::TEXT IS NULL OR c.slug = $2) \
       AND ($3::TEXT IS NULL OR t.name ILIKE '%' || $3 || '%') \
       AND ($4::INTEGER IS NULL OR t.year = $4)";

/// Provides CRUD operations for titles and their genre associations.
pub struct TitleRepo;

impl TitleRepo {
    /// Insert a new title and its genre associations in one transaction.
    pub async fn create(pool: &PgPool, input: &CreateTitle) -> Result<Title, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO titles (name, year, description, category_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let title = sqlx::query_as::<_, Title>(&insert_query)
            .bind(&input.name)
            .bind(input.year)
            .bind(&input.description)
            .bind(input.category_id)
            .fetch_one(&mut *tx)
            .await?;

        Self::set_genres_inner(&mut tx, title.id, &input.genre_ids).await?;

        tx.commit().await?;
        Ok(title)
    }

    /// `true` if a title with this ID exists.
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM titles WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(exists)
    }

    /// Find a title with its category and current review totals.
    pub async fn find_with_stats(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TitleWithStats>, sqlx::Error> {
        let query = format!("{STATS_SELECT} WHERE t.id = $1 {STATS_GROUP_BY}");
        sqlx::query_as::<_, TitleWithStats>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List titles matching `filter` with their review totals, ordered by name.
    pub async fn list_with_stats(
        pool: &PgPool,
        filter: &TitleFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TitleWithStats>, sqlx::Error> {
        let query = format!(
            "{STATS_SELECT} {FILTER_WHERE} {STATS_GROUP_BY} \
             ORDER BY t.name ASC, t.id ASC \
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, TitleWithStats>(&query)
            .bind(&filter.genre)
            .bind(&filter.category)
            .bind(&filter.name)
            .bind(filter.year)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count titles matching `filter`.
    pub async fn count(pool: &PgPool, filter: &TitleFilter) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM titles t \
             JOIN categories c ON c.id = t.category_id \
             {FILTER_WHERE}"
        );
        let (count,): (i64,) = sqlx::query_as(&query)
            .bind(&filter.genre)
            .bind(&filter.category)
            .bind(&filter.name)
            .bind(filter.year)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Update a title. Only non-`None` fields are applied.
    ///
    /// If `genre_ids` is `Some`, replaces all genre associations.
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTitle,
    ) -> Result<Option<Title>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let update_query = format!(
            "UPDATE titles SET
                name = COALESCE($2, name),
                year = COALESCE($3, year),
                description = COALESCE($4, description),
                category_id = COALESCE($5, category_id)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let title = sqlx::query_as::<_, Title>(&update_query)
            .bind(id)
            .bind(&input.name)
            .bind(input.year)
            .bind(&input.description)
            .bind(input.category_id)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(ref title) = title {
            if let Some(ref genre_ids) = input.genre_ids {
                Self::set_genres_inner(&mut tx, title.id, genre_ids).await?;
            }
        }

        tx.commit().await?;
        Ok(title)
    }

    /// Delete a title. Reviews, comments and genre links cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Genre association helpers
    // -----------------------------------------------------------------------

    /// Genres of every title in `title_ids`, ordered by genre name.
    pub async fn genres_for_titles(
        pool: &PgPool,
        title_ids: &[DbId],
    ) -> Result<Vec<TitleGenre>, sqlx::Error> {
        sqlx::query_as::<_, TitleGenre>(
            "SELECT tg.title_id, g.name, g.slug
             FROM title_genres tg
             JOIN genres g ON g.id = tg.genre_id
             WHERE tg.title_id = ANY($1)
             ORDER BY g.name ASC, g.id ASC",
        )
        .bind(title_ids)
        .fetch_all(pool)
        .await
    }

    /// Replace genre associations within an existing transaction.
    async fn set_genres_inner(
        tx: &mut Transaction<'_, Postgres>,
        title_id: DbId,
        genre_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
            .bind(title_id)
            .execute(&mut **tx)
            .await?;

        if !genre_ids.is_empty() {
            sqlx::query(
                "INSERT INTO title_genres (title_id, genre_id)
                 SELECT $1, UNNEST($2::BIGINT[])
                 ON CONFLICT DO NOTHING",
            )
            .bind(title_id)
            .bind(genre_ids)
            .execute(&mut **tx)
            .await?;
        }

        tracing::debug!(title_id, genres = genre_ids.len(), "Replaced title genres");
        Ok(())
    }
}
