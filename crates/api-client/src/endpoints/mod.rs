//! Endpoint-specific API implementations
//!
//! Each module provides a typed interface for one resource. Every method issues
//! exactly one HTTP request and returns the unwrapped envelope payload.
//!
//! | Module | Base path |
//! |--------|-----------|
//! | `authors` | `/authors` |
//! | `books` | `/books` |
//! | `members` | `/members` |
//! | `borrowed_books` | `/borrowed-books` |

pub mod authors;
pub mod books;
pub mod borrowed_books;
pub mod members;

pub use authors::AuthorsApi;
pub use books::BooksApi;
pub use borrowed_books::{BorrowedBooksApi, DEFAULT_PAGE_SIZE};
pub use members::MembersApi;

/// Percent-encode a value used as a single path segment
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
