//! Signup decision logic.
//!
//! Signup is keyed on the (username, email) pair. Given every existing
//! account that shares either the username or the email, [`decide`] returns
//! what the flow must do. The database layer locks those rows before calling
//! it so the decision and the resulting write happen in one transaction.

use crate::error::CoreError;
use crate::types::DbId;

/// The parts of an existing account the decision looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingAccount {
    pub id: DbId,
    pub username: String,
    pub email: String,
}

/// Outcome of a signup attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupDecision {
    /// Nothing matches: create a fresh `user`-role account.
    Create,
    /// The exact pair exists: issue and send a new confirmation code.
    Resend { user_id: DbId },
}

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const EMAIL_TAKEN: &str = "A user with that email already exists.";

/// Decide the signup outcome for `(username, email)` against `matches`.
///
/// `matches` holds every account whose username or email equals the input.
/// A conflict is returned as a field error naming the conflicting field; an
/// email clash is reported before a username clash.
pub fn decide(
    username: &str,
    email: &str,
    matches: &[ExistingAccount],
) -> Result<SignupDecision, CoreError> {
    if let Some(exact) = matches
        .iter()
        .find(|a| a.username == username && a.email == email)
    {
        return Ok(SignupDecision::Resend { user_id: exact.id });
    }

    if matches.iter().any(|a| a.email == email) {
        return Err(CoreError::field("email", EMAIL_TAKEN));
    }

    if matches.iter().any(|a| a.username == username) {
        return Err(CoreError::field("username", USERNAME_TAKEN));
    }

    Ok(SignupDecision::Create)
}
