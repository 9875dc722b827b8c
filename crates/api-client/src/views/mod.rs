//! Client-side filtering, sorting and pagination of cached lists
//!
//! Pure functions over already fetched data. Every call recomputes from the full
//! list; sorts are stable so equal items keep their server order.

pub mod books;
pub mod borrowed_books;
pub mod members;

pub use books::{Availability, BookFilter, BookSort, YearBucket};
pub use borrowed_books::{BorrowedBookFilter, BorrowedBookSort};
pub use members::{MemberFilter, MemberSort, MemberSortField};

use crate::error::ApiError;

/// Lowercased, trimmed search needle; `None` when blank
fn needle(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

/// Case-insensitive substring match against an already lowercased needle
fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn unknown(field: &'static str, value: &str) -> ApiError {
    ApiError::validation(field, format!("unknown value {value}"))
}
