//! Repository for the `users` table.

use sqlx::{PgPool, Postgres, Transaction};
use yamdb_core::types::DbId;

use crate::models::user::{CreateUser, UpdateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, email, first_name, last_name, bio, role, \
                        is_superuser, confirmation_code_hash, created_at, updated_at";

/// Advisory lock classes keeping signup username and email keys apart.
const SIGNUP_LOCK_USERNAME: i32 = 1;
const SIGNUP_LOCK_EMAIL: i32 = 2;

/// Provides CRUD operations for users plus the signup/token helpers.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, first_name, last_name, bio, role)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.bio)
            .bind(input.role.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by username (case-sensitive).
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-sensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// List users ordered by username, optionally filtered by a username substring.
    pub async fn list(
        pool: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE ($1::TEXT IS NULL OR username ILIKE '%' || $1 || '%')
             ORDER BY username ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count users matching the same filter as [`UserRepo::list`].
    pub async fn count(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users
             WHERE ($1::TEXT IS NULL OR username ILIKE '%' || $1 || '%')",
        )
        .bind(search)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Update a user. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                first_name = COALESCE($4, first_name),
                last_name = COALESCE($5, last_name),
                bio = COALESCE($6, bio),
                role = COALESCE($7, role)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.bio)
            .bind(input.role.map(|r| r.as_str()))
            .fetch_optional(pool)
            .await
    }

    /// Delete a user. Reviews and comments cascade. Returns `true` if deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Signup / token helpers
    // -----------------------------------------------------------------------

    /// Lock and return every user whose username or email matches.
    ///
    /// Runs inside the signup transaction. Transaction-scoped advisory locks
    /// on the username and on the email serialize concurrent signups for the
    /// same identity even when no row exists yet, so the decision taken on
    /// the result and the following write cannot interleave. The username
    /// lock is always taken before the email lock.
    pub async fn lock_signup_matches(
        tx: &mut Transaction<'_, Postgres>,
        username: &str,
        email: &str,
    ) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock($1, hashtext($2))")
            .bind(SIGNUP_LOCK_USERNAME)
            .bind(username)
            .execute(&mut **tx)
            .await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1, hashtext($2))")
            .bind(SIGNUP_LOCK_EMAIL)
            .bind(email)
            .execute(&mut **tx)
            .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE username = $1 OR email = $2
             ORDER BY id
             FOR UPDATE"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .bind(email)
            .fetch_all(&mut **tx)
            .await
    }

    /// Insert a signup account (role `user`) holding a confirmation code hash.
    pub async fn create_with_code(
        tx: &mut Transaction<'_, Postgres>,
        username: &str,
        email: &str,
        code_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, confirmation_code_hash)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .bind(email)
            .bind(code_hash)
            .fetch_one(&mut **tx)
            .await
    }

    /// Replace the confirmation code hash of an existing user.
    pub async fn set_confirmation_code(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        code_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "UPDATE users SET confirmation_code_hash = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(code_hash)
            .fetch_one(&mut **tx)
            .await
    }

    /// Atomically check and clear a confirmation code.
    ///
    /// Returns `true` only if the stored hash equalled `code_hash`; the code
    /// is cleared in the same statement so it can be exchanged once.
    pub async fn consume_confirmation_code(
        pool: &PgPool,
        id: DbId,
        code_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET confirmation_code_hash = NULL
             WHERE id = $1 AND confirmation_code_hash = $2",
        )
        .bind(id)
        .bind(code_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Create the bootstrap superuser, or promote the existing account with
    /// the same username. Idempotent.
    pub async fn ensure_superuser(
        pool: &PgPool,
        username: &str,
        email: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, role, is_superuser)
             VALUES ($1, $2, 'admin', true)
             ON CONFLICT ON CONSTRAINT uq_users_username
             DO UPDATE SET role = 'admin', is_superuser = true
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .bind(email)
            .fetch_one(pool)
            .await
    }
}
