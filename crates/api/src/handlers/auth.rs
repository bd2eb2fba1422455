//! Handlers for the `/auth` resource: email signup and code-for-token exchange.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;
use yamdb_core::confirmation::hash_confirmation_code;
use yamdb_core::error::CoreError;
use yamdb_core::signup::{self, ExistingAccount, SignupDecision};
use yamdb_core::validation::{
    check_username_not_reserved, required, validate_request, MAX_EMAIL_LENGTH,
    MAX_USERNAME_LENGTH, USERNAME_RE,
};
use yamdb_db::repositories::UserRepo;
use yamdb_mail::OutgoingEmail;

use crate::auth::jwt::generate_access_token;
use crate::error::{AppError, AppResult};
use crate::middleware::extract::ApiJson;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/signup/`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
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
}

impl SignupRequest {
    /// Validate and return `(username, email)`.
    fn into_valid(self) -> Result<(String, String), CoreError> {
        let mut errors = validate_request(&self);
        if let Some(username) = &self.username {
            check_username_not_reserved(&mut errors, username);
        }
        let username = required(&mut errors, "username", self.username);
        let email = required(&mut errors, "email", self.email);
        match (username, email) {
            (Some(username), Some(email)) if errors.is_empty() => Ok((username, email)),
            _ => Err(CoreError::InvalidFields(errors)),
        }
    }
}

/// Response for `POST /auth/signup/`.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub username: String,
    pub email: String,
}

/// Request body for `POST /auth/token/`.
#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub username: Option<String>,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub confirmation_code: Option<String>,
}

/// Response for `POST /auth/token/`.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/signup/
///
/// Create an account (or re-issue a code for the exact same username and
/// email) and email a fresh confirmation code. The row write commits only
/// after the mailer accepted the message.
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<SignupRequest>,
) -> AppResult<Json<SignupResponse>> {
    let (username, email) = input.into_valid()?;

    let mut tx = state.pool.begin().await?;

    let matches = UserRepo::lock_signup_matches(&mut tx, &username, &email).await?;
    let existing: Vec<ExistingAccount> = matches.iter().map(|u| u.as_existing_account()).collect();

    let code = state.codes.generate();
    let code_hash = hash_confirmation_code(&code);

    let user = match signup::decide(&username, &email, &existing)? {
        SignupDecision::Create => {
            UserRepo::create_with_code(&mut tx, &username, &email, &code_hash).await?
        }
        SignupDecision::Resend { user_id } => {
            UserRepo::set_confirmation_code(&mut tx, user_id, &code_hash).await?
        }
    };

    state
        .mailer
        .send(&OutgoingEmail::confirmation_code(
            &user.email,
            &user.username,
            &code,
        ))
        .await?;

    tx.commit().await?;

    tracing::info!(user_id = user.id, username = %user.username, "Confirmation code issued");

    Ok(Json(SignupResponse {
        username: user.username,
        email: user.email,
    }))
}

/// POST /api/v1/auth/token/
///
/// Exchange a confirmation code for an access token. The code is consumed.
pub async fn token(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let mut errors = validate_request(&input);
    let username = required(&mut errors, "username", input.username);
    let code = required(&mut errors, "confirmation_code", input.confirmation_code);
    let (username, code) = match (username, code) {
        (Some(username), Some(code)) if errors.is_empty() => (username, code),
        _ => return Err(CoreError::InvalidFields(errors).into()),
    };

    let user = UserRepo::find_by_username(&state.pool, &username)
        .await?
        .ok_or_else(|| CoreError::not_found("User", &username))?;

    let consumed =
        UserRepo::consume_confirmation_code(&state.pool, user.id, &hash_confirmation_code(&code))
            .await?;
    if !consumed {
        tracing::info!(user_id = user.id, "Rejected confirmation code");
        return Err(CoreError::Unauthorized("Invalid confirmation code".into()).into());
    }

    let token = generate_access_token(user.id, &user.username, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(user_id = user.id, "Access token issued");

    Ok(Json(TokenResponse { token }))
}
