//! Persistence layer: PostgreSQL pool, migrations, row models and repositories.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Names of the unique constraints the API turns into field errors.
///
/// These must match the migrations in `crates/db/migrations`.
pub mod constraints {
    pub const UQ_USERS_USERNAME: &str = "uq_users_username";
    pub const UQ_USERS_EMAIL: &str = "uq_users_email";
    pub const UQ_CATEGORIES_SLUG: &str = "uq_categories_slug";
    pub const UQ_GENRES_SLUG: &str = "uq_genres_slug";
    pub const UQ_REVIEWS_AUTHOR_TITLE: &str = "uq_reviews_author_title";
    pub const FK_TITLES_CATEGORY_ID: &str = "fk_titles_category_id";
    pub const FK_TITLE_GENRES_GENRE_ID: &str = "fk_title_genres_genre_id";
}

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations embedded from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
