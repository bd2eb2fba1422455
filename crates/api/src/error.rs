use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use yamdb_core::error::{CoreError, FieldErrors};
use yamdb_core::signup::{EMAIL_TAKEN, USERNAME_TAKEN};
use yamdb_db::constraints;
use yamdb_mail::MailError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses:
/// `{"error": "...", "code": "...", "fields": {...}}` where `fields` is
/// present only for field-level validation failures.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `yamdb_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The email transport refused a message.
    #[error("Email delivery failed: {0}")]
    Mail(#[from] MailError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The path exists but does not support the request method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// A path segment that does not parse (e.g. `/titles/abc/`) addresses no
/// resource, so it is reported like any other missing object.
impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        AppError::Core(CoreError::not_found("Resource", "path"))
    }
}

/// Parts of an error response before serialization.
struct ErrorBody {
    status: StatusCode,
    code: &'static str,
    message: String,
    fields: Option<FieldErrors>,
}

impl ErrorBody {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            fields: None,
        }
    }

    fn invalid(fields: FieldErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "VALIDATION_ERROR",
            message: "Validation failed".to_string(),
            fields: Some(fields),
        }
    }

    fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred",
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, key } => ErrorBody::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} {key} not found"),
                ),
                CoreError::Validation(msg) => {
                    ErrorBody::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg)
                }
                CoreError::InvalidFields(fields) => ErrorBody::invalid(fields),
                CoreError::Unauthorized(msg) => {
                    ErrorBody::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
                }
                CoreError::Forbidden(msg) => {
                    ErrorBody::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg)
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    ErrorBody::internal()
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(&err),

            // --- Email ---
            AppError::Mail(err) => {
                tracing::error!(error = %err, "Email delivery failed");
                ErrorBody::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "EMAIL_DELIVERY_FAILED",
                    "The confirmation email could not be sent",
                )
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => ErrorBody::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::MethodNotAllowed => ErrorBody::new(
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
                "Method not allowed",
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                ErrorBody::internal()
            }
        };

        let mut json = json!({
            "error": body.message,
            "code": body.code,
        });
        if let Some(fields) = body.fields {
            json["fields"] = json!(fields);
        }

        (body.status, axum::Json(json)).into_response()
    }
}

/// Field and message reported for a known unique constraint.
fn unique_violation_field(constraint: &str) -> Option<(&'static str, &'static str)> {
    match constraint {
        constraints::UQ_USERS_USERNAME => Some(("username", USERNAME_TAKEN)),
        constraints::UQ_USERS_EMAIL => Some(("email", EMAIL_TAKEN)),
        constraints::UQ_CATEGORIES_SLUG => Some(("slug", "A category with this slug already exists.")),
        constraints::UQ_GENRES_SLUG => Some(("slug", "A genre with this slug already exists.")),
        constraints::UQ_REVIEWS_AUTHOR_TITLE => {
            Some(("non_field_errors", "You have already reviewed this title."))
        }
        _ => None,
    }
}

/// Field and message reported for a known foreign key whose target vanished.
fn foreign_key_violation_field(constraint: &str) -> Option<(&'static str, &'static str)> {
    match constraint {
        constraints::FK_TITLES_CATEGORY_ID => Some(("category", "Category does not exist.")),
        constraints::FK_TITLE_GENRES_GENRE_ID => Some(("genre", "Genre does not exist.")),
        _ => None,
    }
}

/// Classify a sqlx error into an error body.
///
/// - `RowNotFound` maps to 404.
/// - Unique violations on a known `uq_` constraint map to a 400 field error;
///   other `uq_` violations map to 409.
/// - Foreign-key violations on a known title reference map to a 400 field
///   error (the category or genre was deleted mid-request).
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> ErrorBody {
    match err {
        sqlx::Error::RowNotFound => {
            ErrorBody::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
        }
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if let Some((field, message)) = unique_violation_field(constraint) {
                    let mut fields = FieldErrors::new();
                    fields.insert(field.to_string(), vec![message.to_string()]);
                    return ErrorBody::invalid(fields);
                }
                if constraint.starts_with("uq_") {
                    return ErrorBody::new(
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            // PostgreSQL foreign key violation: error code 23503
            if db_err.code().as_deref() == Some("23503") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if let Some((field, message)) = foreign_key_violation_field(constraint) {
                    let mut fields = FieldErrors::new();
                    fields.insert(field.to_string(), vec![message.to_string()]);
                    return ErrorBody::invalid(fields);
                }
            }
            tracing::error!(error = %db_err, "Database error");
            ErrorBody::internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            ErrorBody::internal()
        }
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn field_errors_carry_fields_object() {
        let (status, json) = render(CoreError::field("slug", "taken").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["fields"]["slug"][0], "taken");
    }

    #[tokio::test]
    async fn plain_errors_have_no_fields() {
        let (status, json) =
            render(CoreError::Unauthorized("no credentials".into()).into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "no credentials");
        assert!(json.get("fields").is_none());
    }

    #[tokio::test]
    async fn internal_errors_are_sanitized() {
        let (status, json) = render(AppError::InternalError("secret detail".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "An internal error occurred");
    }

    #[tokio::test]
    async fn mail_failures_are_service_unavailable() {
        let (status, json) = render(MailError::Rejected("down".into()).into()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["code"], "EMAIL_DELIVERY_FAILED");
    }

    #[tokio::test]
    async fn method_not_allowed_envelope() {
        let (status, json) = render(AppError::MethodNotAllowed).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(json["code"], "METHOD_NOT_ALLOWED");
    }

    #[test]
    fn known_constraints_map_to_fields() {
        assert_eq!(
            unique_violation_field("uq_users_email").map(|(f, _)| f),
            Some("email")
        );
        assert_eq!(
            unique_violation_field("uq_genres_slug").map(|(f, _)| f),
            Some("slug")
        );
        assert!(unique_violation_field("uq_something_else").is_none());
    }

    #[test]
    fn title_references_map_to_fields() {
        assert_eq!(
            foreign_key_violation_field("fk_titles_category_id").map(|(f, _)| f),
            Some("category")
        );
        assert_eq!(
            foreign_key_violation_field("fk_title_genres_genre_id").map(|(f, _)| f),
            Some("genre")
        );
        assert!(foreign_key_violation_field("fk_reviews_title_id").is_none());
    }
}
