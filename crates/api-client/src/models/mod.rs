//! Wire types for the Libris REST API
//!
//! Field names follow the server's camelCase JSON. Write payloads carry a
//! `validate()` that every mutation runs before issuing its request.

pub mod author;
pub mod book;
pub mod borrowed_book;
pub mod member;

pub use author::{Author, AuthorCreateRequest, AuthorFilters};
pub use book::{Book, BookCreateRequest, BookFilters, BookSearch, BookSummary};
pub use borrowed_book::{
    BorrowRequest, BorrowStatus, BorrowedBook, BorrowedBookFilters, BorrowedBookSearch,
    BorrowedBookUpdateRequest, BorrowingStats, SortDirection,
};
pub use member::{Member, MemberCreateRequest, MemberFilters, MembershipStatus};

use crate::error::{ApiError, ApiResult};

/// Reject blank strings
pub(crate) fn require_text(field: &'static str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        Err(ApiError::validation(field, "must not be empty"))
    } else {
        Ok(())
    }
}
