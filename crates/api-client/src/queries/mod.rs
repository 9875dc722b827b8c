//! Per-resource cached reads and writes
//!
//! Each read names its cache key, its staleness window and, where it takes a
//! parameter, the condition under which it is enabled. Each write pairs one API
//! call with a pure effects function `(request, response) -> Vec<CacheCommand>`
//! that is public so the rules can be inspected and tested without a server.

pub mod authors;
pub mod books;
pub mod borrowed_books;
pub mod members;

pub use authors::AuthorQueries;
pub use books::BookQueries;
pub use borrowed_books::BorrowedBookQueries;
pub use members::MemberQueries;
