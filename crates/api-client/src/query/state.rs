//! Outcome of a cached read

use crate::error::ApiError;
use std::sync::Arc;
use std::time::Duration;

/// State of one read
///
/// `NotRequested` means the read was disabled because a required parameter was
/// missing; no request was issued. Failures are shared between every caller that
/// joined the same in-flight request, hence the `Arc`.
#[derive(Debug, Clone)]
pub enum QueryState<T> {
    /// Disabled read, nothing was requested
    NotRequested,
    /// A request for the key is in flight
    Loading,
    /// Data is available
    Ready(T),
    /// The last request failed
    Failed(Arc<ApiError>),
}

impl<T> QueryState<T> {
    /// Whether data is available
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Whether a request is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Whether the read was disabled
    #[must_use]
    pub fn is_not_requested(&self) -> bool {
        matches!(self, Self::NotRequested)
    }

    /// Borrow the data, if any
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }

    /// Take the data, if any
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }

    /// Borrow the error, if the read failed
    #[must_use]
    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Map the data, keeping every other state
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> QueryState<U> {
        match self {
            Self::NotRequested => QueryState::NotRequested,
            Self::Loading => QueryState::Loading,
            Self::Ready(data) => QueryState::Ready(f(data)),
            Self::Failed(error) => QueryState::Failed(error),
        }
    }

    /// Collapse into a result; `None` when there is neither data nor error
    pub fn into_result(self) -> Option<Result<T, Arc<ApiError>>> {
        match self {
            Self::Ready(data) => Some(Ok(data)),
            Self::Failed(error) => Some(Err(error)),
            Self::NotRequested | Self::Loading => None,
        }
    }
}

/// Per-read options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Age after which the cached value is refetched on the next read
    pub stale_time: Duration,
    /// Disabled reads return `NotRequested` without touching cache or network
    pub enabled: bool,
}

impl QueryOptions {
    /// Enabled read with a staleness window
    #[must_use]
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            enabled: true,
        }
    }

    /// Builder-style method to gate the read
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let ready = QueryState::Ready(3);
        assert!(ready.is_ready());
        assert_eq!(ready.data(), Some(&3));
        assert_eq!(ready.map(|n| n * 2).into_data(), Some(6));

        let failed: QueryState<i32> = QueryState::Failed(Arc::new(ApiError::api(404, "missing")));
        assert!(failed.error().is_some_and(ApiError::is_not_found));
        assert!(matches!(failed.into_result(), Some(Err(_))));

        assert!(QueryState::<i32>::NotRequested.into_result().is_none());
        assert!(QueryState::<i32>::Loading.is_loading());
    }

    #[test]
    fn test_options() {
        let options = QueryOptions::new(Duration::from_secs(120)).enabled(false);
        assert!(!options.enabled);
        assert_eq!(options.stale_time, Duration::from_secs(120));
    }
}
