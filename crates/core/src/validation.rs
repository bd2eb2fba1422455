//! Field-level validation rules shared by the API request types.
//!
//! Request DTOs derive [`validator::Validate`] for the declarative rules
//! (lengths, patterns, email syntax, ranges). The rules that need runtime
//! context live here as functions that append to a [`FieldErrors`] map, so a
//! request reports every problem at once, keyed by field.

use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;
use validator::{Validate, ValidationErrors};

use crate::error::{CoreError, FieldErrors};

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

pub const MAX_USERNAME_LENGTH: u64 = 150;
pub const MAX_EMAIL_LENGTH: u64 = 254;
pub const MAX_PERSON_NAME_LENGTH: u64 = 150;
pub const MAX_NAME_LENGTH: u64 = 256;
pub const MAX_SLUG_LENGTH: u64 = 50;
pub const MIN_SCORE: i16 = 1;
pub const MAX_SCORE: i16 = 10;

/// Reserved because `/users/me/` addresses the caller's own profile.
pub const RESERVED_USERNAME: &str = "me";

pub const REQUIRED: &str = "This field is required.";

/// Word characters plus `. @ + -`.
pub static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));

/// Letters, digits, hyphens and underscores.
pub static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug regex"));

/* --------------------------------------------------------------------------
Collecting errors
-------------------------------------------------------------------------- */

/// Run the derived rules of `input` and return them keyed by field.
pub fn validate_request<T: Validate>(input: &T) -> FieldErrors {
    match input.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => into_field_errors(&errors),
    }
}

/// Flatten `validator` output into the API's field -> messages map.
pub fn into_field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, list) in errors.field_errors() {
        let messages = out.entry(field.to_string()).or_default();
        for error in list.iter() {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value ({}).", error.code));
            messages.push(message);
        }
    }
    out
}

/// Append a message for `field`.
pub fn push(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

/// Record [`REQUIRED`] for a missing value and pass the value through.
pub fn required<T>(errors: &mut FieldErrors, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        push(errors, field, REQUIRED);
    }
    value
}

/// Turn collected errors into a result.
pub fn finish(errors: FieldErrors) -> Result<(), CoreError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::InvalidFields(errors))
    }
}

/* --------------------------------------------------------------------------
Contextual rules
-------------------------------------------------------------------------- */

/// The username `me` is never allowed.
pub fn check_username_not_reserved(errors: &mut FieldErrors, username: &str) {
    if username == RESERVED_USERNAME {
        push(
            errors,
            "username",
            format!("Using \"{RESERVED_USERNAME}\" as a username is not allowed."),
        );
    }
}

/// Release year must not be negative or later than `current_year`.
pub fn check_year(errors: &mut FieldErrors, year: i32, current_year: i32) {
    if year < 0 {
        push(errors, "year", "Year cannot be negative.");
    } else if year > current_year {
        push(
            errors,
            "year",
            format!("Year cannot be later than the current year ({current_year})."),
        );
    }
}

/// The current UTC year, evaluated per call.
pub fn current_year() -> i32 {
    chrono::Utc::now().year()
}
