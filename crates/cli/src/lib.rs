//! Terminal helpers shared by Libris command-line tools
//!
//! Provides shared CLI functionality:
//! - Status messages and value formatting
//! - Text or JSON rendering of command results
//! - Spinners for requests in flight

#![warn(missing_docs)]

pub mod output;
pub mod progress;

pub use output::{OutputFormat, Status};
