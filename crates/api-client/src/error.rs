//! Error types for the API client

use libris_core::flight::FlightAborted;
use libris_core::retry::{FailureClass, Retryable};
use std::fmt;
use thiserror::Error;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// API returned a non-2xx response
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Envelope message, or the raw body when it was not an envelope
        message: String,
    },

    /// API answered 2xx with `success: false`
    #[error("Request rejected: {message}")]
    Rejected {
        /// Envelope message
        message: String,
    },

    /// A successful envelope carried no `data`
    #[error("Response for {0} carried no data")]
    MissingData(String),

    /// A payload failed the client-side checks and was not sent
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// Offending field, as named on the wire
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// The shared request this read joined ended without a result
    #[error("Request aborted: {0}")]
    Aborted(#[from] FlightAborted),
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an API response error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// HTTP status of the failed response, if there was one
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is retryable under the read policy
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.failure_class() {
            FailureClass::Network | FailureClass::Server(_) => true,
            class => class.is_throttled(),
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self.failure_class(), FailureClass::Client(_))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self.failure_class(), FailureClass::Server(_))
    }

    /// Check if the server reported the entity as missing
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl Retryable for ApiError {
    fn failure_class(&self) -> FailureClass {
        match self {
            Self::Api { status, .. } => FailureClass::from_status(*status),
            Self::Request(e) => match e.status() {
                Some(status) => FailureClass::from_status(status.as_u16()),
                None if e.is_decode() || e.is_builder() => FailureClass::Permanent,
                None => FailureClass::Network,
            },
            Self::Timeout(_) => FailureClass::Network,
            Self::Json(_)
            | Self::Config(_)
            | Self::Rejected { .. }
            | Self::MissingData(_)
            | Self::Validation { .. }
            | Self::Aborted(_) => FailureClass::Permanent,
        }
    }
}

/// Error context for better debugging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Request ID for correlation
    pub request_id: Option<String>,
    /// Endpoint that was called
    pub endpoint: String,
    /// HTTP method used
    pub method: String,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)?;
        if let Some(ref id) = self.request_id {
            write!(f, " (request_id: {id})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_failure_classes() {
        assert_eq!(ApiError::api(503, "down").failure_class(), FailureClass::Server(503));
        assert_eq!(ApiError::api(404, "gone").failure_class(), FailureClass::Client(404));
        assert_eq!(
            ApiError::Timeout(Duration::from_secs(10)).failure_class(),
            FailureClass::Network
        );
        assert_eq!(
            ApiError::validation("email", "must contain '@'").failure_class(),
            FailureClass::Permanent
        );
    }

    #[test]
    fn test_retryable() {
        assert!(ApiError::api(500, "").is_retryable());
        assert!(ApiError::api(429, "").is_retryable());
        assert!(ApiError::api(408, "").is_retryable());
        assert!(!ApiError::api(404, "").is_retryable());
        assert!(!ApiError::Rejected { message: "no".into() }.is_retryable());
        assert!(!ApiError::from(FlightAborted::Panicked).is_retryable());
    }

    #[test]
    fn test_status_helpers() {
        let err = ApiError::api(404, "Book not found");
        assert!(err.is_not_found());
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert_eq!(err.to_string(), "API error (404): Book not found");
        assert_eq!(ApiError::MissingData("books/1".into()).status(), None);
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext {
            request_id: Some("abc".into()),
            endpoint: "/books/1".into(),
            method: "GET".into(),
        };
        assert_eq!(ctx.to_string(), "GET /books/1 (request_id: abc)");
    }
}
