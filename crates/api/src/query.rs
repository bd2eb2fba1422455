//! Shared query parameter types for API handlers.

use serde::Deserialize;
use yamdb_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> i64 {
        clamp_limit(self.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    /// Offset clamped to be non-negative.
    pub fn offset(&self) -> i64 {
        clamp_offset(self.offset)
    }
}

/// `?search=&limit=&offset=` for the genre, category and user lists.
///
/// Not `#[serde(flatten)]`: flattened query fields lose integer parsing.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SearchParams {
    /// Trimmed, non-empty search term.
    pub fn term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn page(&self) -> PaginationParams {
        PaginationParams {
            limit: self.limit,
            offset: self.offset,
        }
    }
}
