//! Books

use super::require_text;
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};

/// Book as returned by the server
///
/// `0 <= available_copies <= total_copies` holds for every record the server
/// returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub publishing_year: i32,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub total_copies: u32,
    pub available_copies: u32,
    pub author_id: i64,
    pub author_name: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Book {
    /// Whether at least one copy can be borrowed
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Copies currently out on loan
    #[must_use]
    pub fn borrowed_copies(&self) -> u32 {
        self.total_copies.saturating_sub(self.available_copies)
    }
}

/// Book projection used by author pages and the summaries endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub publishing_year: i32,
    pub available_copies: u32,
    pub total_copies: u32,
}

/// Payload for creating or updating a book
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookCreateRequest {
    pub title: String,
    pub category: String,
    pub publishing_year: i32,
    pub author_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_copies: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_copies: Option<u32>,
}

impl BookCreateRequest {
    /// Create a payload with the required fields
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        publishing_year: i32,
        author_id: i64,
    ) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            publishing_year,
            author_id,
            ..Self::default()
        }
    }

    /// Set total and available copies
    #[must_use]
    pub fn with_copies(mut self, total: u32, available: u32) -> Self {
        self.total_copies = Some(total);
        self.available_copies = Some(available);
        self
    }

    /// Set the ISBN
    #[must_use]
    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check the payload before sending it
    pub fn validate(&self) -> ApiResult<()> {
        require_text("title", &self.title)?;
        require_text("category", &self.category)?;

        if self.author_id <= 0 {
            return Err(ApiError::validation("authorId", "must reference an author"));
        }
        if self.total_copies == Some(0) {
            return Err(ApiError::validation("totalCopies", "must be at least 1"));
        }
        if let (Some(total), Some(available)) = (self.total_copies, self.available_copies) {
            if available > total {
                return Err(ApiError::validation(
                    "availableCopies",
                    format!("{available} exceeds total copies {total}"),
                ));
            }
        }
        Ok(())
    }
}

/// Filters embedded in book list and summary keys, sent as query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl BookFilters {
    /// Whether no filter is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Body of the book search endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl BookSearch {
    /// Whether no criterion is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
