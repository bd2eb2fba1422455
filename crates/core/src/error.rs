use std::collections::BTreeMap;

/// Field name -> list of human-readable messages for that field.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Validation failed for fields: {}", field_names(.0))]
    InvalidFields(FieldErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a `NotFound` keyed by anything displayable (id, slug, username).
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// A validation error carrying a single message on a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        CoreError::InvalidFields(errors)
    }
}

fn field_names(errors: &FieldErrors) -> String {
    errors.keys().cloned().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_error_display_lists_fields() {
        let err = CoreError::field("username", "taken");
        assert_eq!(err.to_string(), "Validation failed for fields: username");
    }

    #[test]
    fn not_found_accepts_string_keys() {
        let err = CoreError::not_found("Genre", "horror");
        assert_eq!(err.to_string(), "Entity not found: Genre horror");
    }
}
