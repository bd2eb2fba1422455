//! Handlers for the `/users` resource.
//!
//! `/users/` and `/users/{username}/` are admin-only account management.
//! `/users/me/` lets any authenticated user read and edit their own
//! profile; the role cannot be changed there.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;
use yamdb_core::error::{CoreError, FieldErrors};
use yamdb_core::roles::Role;
use yamdb_core::signup::{EMAIL_TAKEN, USERNAME_TAKEN};
use yamdb_core::types::DbId;
use yamdb_core::validation::{
    check_username_not_reserved, finish, push, required, validate_request, MAX_EMAIL_LENGTH,
    MAX_PERSON_NAME_LENGTH, MAX_USERNAME_LENGTH, USERNAME_RE,
};
use yamdb_db::models::user::{CreateUser, UpdateUser, User, UserProfile};
use yamdb_db::repositories::UserRepo;

use crate::error::AppResult;
use crate::middleware::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::rbac::{Permit, Profile, Users};
use crate::query::SearchParams;
use crate::response::Page;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Body for `POST /users/`, `PATCH /users/{username}/` and `PATCH /users/me/`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserWriteRequest {
    #[validate(
        length(
            min = 1,
            max = MAX_USERNAME_LENGTH,
            message = "Username must be between 1 and 150 characters."
        ),
        regex(
            path = *USERNAME_RE,
            message = "Username may contain only letters, digits and @/./+/-/_ characters."
        )
    )]
    pub username: Option<String>,
    #[validate(
        length(max = MAX_EMAIL_LENGTH, message = "Email must be at most 254 characters."),
        email(message = "Enter a valid email address.")
    )]
    pub email: Option<String>,
    #[validate(length(
        max = MAX_PERSON_NAME_LENGTH,
        message = "First name must be at most 150 characters."
    ))]
    pub first_name: Option<String>,
    #[validate(length(
        max = MAX_PERSON_NAME_LENGTH,
        message = "Last name must be at most 150 characters."
    ))]
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<String>,
}

impl UserWriteRequest {
    /// Field rules shared by create and update, plus uniqueness pre-checks
    /// against every account other than `self_id`.
    async fn collect_errors(
        &self,
        pool: &PgPool,
        self_id: Option<DbId>,
        role: &mut Option<Role>,
    ) -> AppResult<FieldErrors> {
        let mut errors = validate_request(self);

        if let Some(username) = &self.username {
            check_username_not_reserved(&mut errors, username);
            if let Some(other) = UserRepo::find_by_username(pool, username).await? {
                if Some(other.id) != self_id {
                    push(&mut errors, "username", USERNAME_TAKEN);
                }
            }
        }

        if let Some(email) = &self.email {
            if let Some(other) = UserRepo::find_by_email(pool, email).await? {
                if Some(other.id) != self_id {
                    push(&mut errors, "email", EMAIL_TAKEN);
                }
            }
        }

        if let Some(raw) = &self.role {
            match raw.parse::<Role>() {
                Ok(parsed) => *role = Some(parsed),
                Err(err) => push(&mut errors, "role", err.to_string()),
            }
        }

        Ok(errors)
    }
}

/// Validate `input` and apply it to `user`. `allow_role` is false for `/users/me/`.
async fn apply_update(
    pool: &PgPool,
    user: User,
    mut input: UserWriteRequest,
    allow_role: bool,
) -> AppResult<UserProfile> {
    if !allow_role {
        input.role = None;
    }

    let mut role = None;
    let errors = input.collect_errors(pool, Some(user.id), &mut role).await?;
    finish(errors)?;

    let updated = UserRepo::update(
        pool,
        user.id,
        &UpdateUser {
            username: input.username,
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            bio: input.bio,
            role,
        },
    )
    .await?
    .ok_or_else(|| CoreError::not_found("User", &user.username))?;

    Ok(updated.into())
}

async fn load_by_username(pool: &PgPool, username: &str) -> AppResult<User> {
    UserRepo::find_by_username(pool, username)
        .await?
        .ok_or_else(|| CoreError::not_found("User", username).into())
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

/// GET /api/v1/users/
///
/// `?search=` matches a username substring.
pub async fn list_users(
    _permit: Permit<Users>,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> AppResult<Json<Page<UserProfile>>> {
    let page = params.page();
    let search = params.term();
    let count = UserRepo::count(&state.pool, search).await?;
    let users = UserRepo::list(&state.pool, search, page.limit(), page.offset()).await?;
    let results = users.into_iter().map(UserProfile::from).collect();
    Ok(Json(Page::new(count, results)))
}

/// POST /api/v1/users/
pub async fn create_user(
    permit: Permit<Users>,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UserWriteRequest>,
) -> AppResult<impl IntoResponse> {
    let mut role = None;
    let mut errors = input.collect_errors(&state.pool, None, &mut role).await?;
    let username = required(&mut errors, "username", input.username);
    let email = required(&mut errors, "email", input.email);
    let (username, email) = match (username, email) {
        (Some(username), Some(email)) if errors.is_empty() => (username, email),
        _ => return Err(CoreError::InvalidFields(errors).into()),
    };

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username,
            email,
            first_name: input.first_name.unwrap_or_default(),
            last_name: input.last_name.unwrap_or_default(),
            bio: input.bio.unwrap_or_default(),
            role: role.unwrap_or_default(),
        },
    )
    .await?;

    tracing::info!(
        user_id = user.id,
        role = %user.role,
        admin_id = permit.user().map(|u| u.user_id),
        "User created",
    );

    Ok((StatusCode::CREATED, Json(UserProfile::from(user))))
}

/// GET /api/v1/users/{username}/
pub async fn get_user(
    _permit: Permit<Users>,
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> AppResult<Json<UserProfile>> {
    let user = load_by_username(&state.pool, &username).await?;
    Ok(Json(user.into()))
}

/// PATCH /api/v1/users/{username}/
pub async fn update_user(
    permit: Permit<Users>,
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
    ApiJson(input): ApiJson<UserWriteRequest>,
) -> AppResult<Json<UserProfile>> {
    let user = load_by_username(&state.pool, &username).await?;
    let user_id = user.id;
    let profile = apply_update(&state.pool, user, input, true).await?;

    tracing::info!(
        user_id,
        role = %profile.role,
        admin_id = permit.user().map(|u| u.user_id),
        "User updated",
    );

    Ok(Json(profile))
}

/// DELETE /api/v1/users/{username}/
///
/// The user's reviews and comments are deleted with the account.
pub async fn delete_user(
    permit: Permit<Users>,
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> AppResult<StatusCode> {
    let user = load_by_username(&state.pool, &username).await?;
    UserRepo::delete(&state.pool, user.id).await?;

    tracing::info!(
        user_id = user.id,
        admin_id = permit.user().map(|u| u.user_id),
        "User deleted",
    );

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Self-service
// ---------------------------------------------------------------------------

/// GET /api/v1/users/me/
pub async fn get_me(
    permit: Permit<Profile>,
    State(state): State<AppState>,
) -> AppResult<Json<UserProfile>> {
    let me = permit.require_user()?;
    let user = UserRepo::find_by_id(&state.pool, me.user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("User", &me.username))?;
    Ok(Json(user.into()))
}

/// PATCH /api/v1/users/me/
///
/// `role` in the body is ignored.
pub async fn update_me(
    permit: Permit<Profile>,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UserWriteRequest>,
) -> AppResult<Json<UserProfile>> {
    let me = permit.require_user()?;
    let user = UserRepo::find_by_id(&state.pool, me.user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("User", &me.username))?;

    let profile = apply_update(&state.pool, user, input, false).await?;

    tracing::info!(user_id = me.user_id, "Profile updated");

    Ok(Json(profile))
}
