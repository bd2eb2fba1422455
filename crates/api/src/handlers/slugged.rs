//! Request body shared by the slug-keyed catalog resources (categories and genres).

use serde::Deserialize;
use validator::Validate;
use yamdb_core::error::CoreError;
use yamdb_core::validation::{
    required, validate_request, MAX_NAME_LENGTH, MAX_SLUG_LENGTH, SLUG_RE,
};

/// `{name, slug}` body for `POST /categories/` and `POST /genres/`.
#[derive(Debug, Deserialize, Validate)]
pub struct NameSlugRequest {
    #[validate(length(
        min = 1,
        max = MAX_NAME_LENGTH,
        message = "Name must be between 1 and 256 characters."
    ))]
    pub name: Option<String>,
    #[validate(
        length(
            min = 1,
            max = MAX_SLUG_LENGTH,
            message = "Slug must be between 1 and 50 characters."
        ),
        regex(
            path = *SLUG_RE,
            message = "Slug may contain only letters, digits, hyphens and underscores."
        )
    )]
    pub slug: Option<String>,
}

impl NameSlugRequest {
    /// Validate and return `(name, slug)`.
    pub fn into_valid(self) -> Result<(String, String), CoreError> {
        let mut errors = validate_request(&self);
        let name = required(&mut errors, "name", self.name);
        let slug = required(&mut errors, "slug", self.slug);
        match (name, slug) {
            (Some(name), Some(slug)) if errors.is_empty() => Ok((name, slug)),
            _ => Err(CoreError::InvalidFields(errors)),
        }
    }
}
