//! Authors

use super::book::BookSummary;
use super::require_text;
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};

/// Author as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub nationality: String,
    pub biography: Option<String>,
    pub birth_year: Option<i32>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// Only filled by the with-books endpoint
    pub books: Option<Vec<BookSummary>>,
}

/// Payload for creating or updating an author
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorCreateRequest {
    pub name: String,
    pub nationality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
}

impl AuthorCreateRequest {
    /// Create a payload with the required fields
    pub fn new(name: impl Into<String>, nationality: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nationality: nationality.into(),
            ..Self::default()
        }
    }

    /// Set the biography
    #[must_use]
    pub fn with_biography(mut self, biography: impl Into<String>) -> Self {
        self.biography = Some(biography.into());
        self
    }

    /// Set the birth year
    #[must_use]
    pub fn with_birth_year(mut self, year: i32) -> Self {
        self.birth_year = Some(year);
        self
    }

    /// Check the payload before sending it
    pub fn validate(&self) -> ApiResult<()> {
        require_text("name", &self.name)?;
        require_text("nationality", &self.nationality)?;
        if matches!(self.birth_year, Some(year) if year <= 0) {
            return Err(ApiError::validation("birthYear", "must be positive"));
        }
        Ok(())
    }
}

/// Filters embedded in author list keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorFilters {
    pub nationality: Option<String>,
    pub search_term: Option<String>,
}
