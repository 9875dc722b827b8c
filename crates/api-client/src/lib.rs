//! Data-access layer for the Libris library REST API
//!
//! This crate provides a typed HTTP client for the library backend together with
//! a query layer that caches reads and keeps the cache coherent after writes.
//!
//! # Features
//!
//! - **Environment-based configuration**: base URL and timeout from
//!   `LIBRIS_API_URL` and `LIBRIS_TIMEOUT_SECS`
//! - **Typed resource APIs**: authors, books, members and borrowing records
//! - **Hierarchical cache keys**: prefix invalidation of whole key families
//! - **Cached reads**: staleness windows, enabled gating, request de-duplication
//!   and retry with exponential backoff
//! - **Cache-coherent writes**: every mutation applies an explicit list of cache
//!   commands computed from the server's response
//! - **Request correlation**: every request carries an `X-Request-ID`
//!
//! # Example
//!
//! ```rust,no_run
//! use libris_api_client::{ClientConfig, LibraryClient, QueryClient};
//! use libris_core::cache::QueryConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = LibraryClient::with_config(ClientConfig::from_env()?)?;
//!     let queries = QueryClient::new(api, QueryConfig::default());
//!
//!     // Served from cache on the second call
//!     let books = queries.books().all().await;
//!     if let Some(books) = books.data() {
//!         println!("{} books", books.len());
//!     }
//!
//!     // Disabled read: no id, no request
//!     assert!(queries.members().detail(None).await.is_not_requested());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod models;
pub mod queries;
pub mod query;
pub mod views;

pub use client::LibraryClient;
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use query::{QueryClient, QueryOptions, QueryState};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::LibraryClient;
    pub use crate::config::ClientConfig;
    pub use crate::endpoints::{AuthorsApi, BooksApi, BorrowedBooksApi, MembersApi};
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::keys;
    pub use crate::models::*;
    pub use crate::queries::{AuthorQueries, BookQueries, BorrowedBookQueries, MemberQueries};
    pub use crate::query::{QueryClient, QueryOptions, QueryState};
    pub use crate::views::{BookFilter, BookSort, BorrowedBookFilter, BorrowedBookSort, MemberFilter, MemberSort};
}
