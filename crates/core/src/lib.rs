//! Core building blocks for the Libris data-access layer
//!
//! This crate holds the pieces that do not know anything about HTTP or about the
//! library domain:
//!
//! - **Query keys**: hierarchical, structurally compared cache keys
//! - **Query cache**: keyed payload store with staleness windows and invalidation
//! - **Single flight**: coalescing of concurrent identical requests
//! - **Retry policy**: read/write retry rules with exponential backoff
//! - **Listing**: page slicing for client-side views
//!
//! # Example
//!
//! ```rust
//! use libris_core::cache::{CacheCommand, QueryCache};
//! use libris_core::key::QueryKey;
//! use std::time::Duration;
//!
//! let cache = QueryCache::new();
//! let list = QueryKey::root("books").push("list");
//!
//! cache.set(&list, serde_json::json!([]), Duration::from_secs(300));
//! cache.apply(&[CacheCommand::Invalidate(QueryKey::root("books"))]);
//!
//! assert!(cache.is_stale(&list));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod flight;
pub mod key;
pub mod listing;
pub mod retry;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::{CacheCommand, CacheTime, FetchedWrite, QueryCache, QueryConfig};
    pub use crate::flight::{FlightAborted, SingleFlight};
    pub use crate::key::{KeySegment, QueryKey};
    pub use crate::listing::{paginate, Page};
    pub use crate::retry::{FailureClass, RetryPolicy};
}
