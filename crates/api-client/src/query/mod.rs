//! Cached reads and cache-updating writes
//!
//! [`QueryClient`] binds the HTTP client to a shared [`QueryCache`]:
//!
//! - **reads** ([`QueryClient::fetch`]) serve fresh cached values without I/O,
//!   coalesce concurrent requests for the same key, retry under the read policy
//!   and store the payload on success
//! - **writes** ([`QueryClient::mutate`]) retry under the write policy and, on
//!   success only, apply the cache commands computed from the response
//! - **creates** ([`QueryClient::mutate_once`]) are sent exactly once
//!
//! A failed read or write never touches the cache. A read still in flight when a
//! write invalidates its key is detached: its result is stored stale and later
//! readers start a new request.

mod state;

pub use state::{QueryOptions, QueryState};

use crate::client::LibraryClient;
use crate::error::{ApiError, ApiResult};
use crate::queries::{AuthorQueries, BookQueries, BorrowedBookQueries, MemberQueries};
use libris_core::cache::{CacheCommand, FetchedWrite, QueryCache, QueryConfig};
use libris_core::flight::SingleFlight;
use libris_core::key::QueryKey;
use libris_core::retry::{RetryPolicy, Retryable};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

type SharedResult = Result<Value, Arc<ApiError>>;

/// Query layer entry point
///
/// Cheap to clone; clones share the cache and the in-flight registry.
#[derive(Clone)]
pub struct QueryClient {
    api: LibraryClient,
    cache: Arc<QueryCache>,
    in_flight: SingleFlight<QueryKey, SharedResult>,
    config: Arc<QueryConfig>,
}

impl QueryClient {
    /// Create a query client with its own cache
    #[must_use]
    pub fn new(api: LibraryClient, config: QueryConfig) -> Self {
        let cache = Arc::new(QueryCache::with_stale_time(config.stale_time));
        Self::with_cache(api, cache, config)
    }

    /// Create a query client over an existing cache
    #[must_use]
    pub fn with_cache(api: LibraryClient, cache: Arc<QueryCache>, config: QueryConfig) -> Self {
        Self {
            api,
            cache,
            in_flight: SingleFlight::new(),
            config: Arc::new(config),
        }
    }

    /// The underlying HTTP client
    #[must_use]
    pub fn api(&self) -> &LibraryClient {
        &self.api
    }

    /// The shared cache
    #[must_use]
    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// The query configuration
    #[must_use]
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Resource accessors
    // -------------------------------------------------------------------------

    /// Author reads and writes
    #[must_use]
    pub fn authors(&self) -> AuthorQueries {
        AuthorQueries::new(self.clone())
    }

    /// Book reads and writes
    #[must_use]
    pub fn books(&self) -> BookQueries {
        BookQueries::new(self.clone())
    }

    /// Member reads and writes
    #[must_use]
    pub fn members(&self) -> MemberQueries {
        MemberQueries::new(self.clone())
    }

    /// Borrowing reads and writes
    #[must_use]
    pub fn borrowed_books(&self) -> BorrowedBookQueries {
        BorrowedBookQueries::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Read `key`, fetching with `fetch` when the cached value is missing or stale
    ///
    /// `fetch` may be called several times when the read policy retries.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, options: QueryOptions, fetch: F) -> QueryState<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        if !options.enabled {
            return QueryState::NotRequested;
        }

        if let Some(snapshot) = self.cache.snapshot(&key) {
            if !snapshot.stale {
                if let Ok(data) = serde_json::from_value(snapshot.value) {
                    debug!(key = %key, age_ms = snapshot.age.as_millis(), "Cache hit");
                    return QueryState::Ready(data);
                }
            }
        }

        let cache = Arc::clone(&self.cache);
        let policy = self.config.reads.clone();
        let load_key = key.clone();
        let outcome = self
            .in_flight
            .run(key.clone(), move || {
                load(cache, policy, load_key, options.stale_time, fetch)
            })
            .await
            .unwrap_or_else(|aborted| Err(Arc::new(ApiError::from(aborted))));

        match outcome {
            Ok(value) => decode(&key, value),
            Err(error) => QueryState::Failed(error),
        }
    }

    /// Current state of `key` without fetching
    pub fn peek<T: DeserializeOwned>(&self, key: &QueryKey) -> QueryState<T> {
        if self.in_flight.is_in_flight(key) {
            return QueryState::Loading;
        }
        match self.cache.snapshot(key) {
            Some(snapshot) => decode(key, snapshot.value),
            None => QueryState::NotRequested,
        }
    }

    /// Warm `key` so a later read is served from cache
    ///
    /// Returns whether the key now holds data. Failures are logged, not returned.
    pub async fn prefetch<T, F, Fut>(&self, key: QueryKey, options: QueryOptions, fetch: F) -> bool
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let label = key.to_string();
        match self.fetch::<T, F, Fut>(key, options, fetch).await {
            QueryState::Ready(_) => true,
            QueryState::Failed(error) => {
                debug!(key = %label, error = %error, "Prefetch failed");
                false
            }
            QueryState::NotRequested | QueryState::Loading => false,
        }
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Run a write and apply its cache effects on success
    ///
    /// `operation` names the write in logs ("update author"). `effects` receives the
    /// server's response and returns the commands to apply.
    pub async fn mutate<T, F, Fut, E>(&self, operation: &str, write: F, effects: E) -> ApiResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
        E: FnOnce(&T) -> Vec<CacheCommand>,
    {
        self.write_with(&self.config.writes, operation, write, effects).await
    }

    /// Like [`QueryClient::mutate`], but the write is never retried
    ///
    /// Use it for creates: the server may have stored the record even when the
    /// response was lost.
    pub async fn mutate_once<T, F, Fut, E>(&self, operation: &str, write: F, effects: E) -> ApiResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
        E: FnOnce(&T) -> Vec<CacheCommand>,
    {
        self.write_with(&RetryPolicy::no_retry(), operation, write, effects).await
    }

    async fn write_with<T, F, Fut, E>(&self, policy: &RetryPolicy, operation: &str, write: F, effects: E) -> ApiResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
        E: FnOnce(&T) -> Vec<CacheCommand>,
    {
        match with_retry(policy, operation, write).await {
            Ok(response) => {
                let commands = effects(&response);
                let detached = self
                    .in_flight
                    .forget(|key| commands.iter().any(|command| command.covers(key)));
                debug!(operation, commands = commands.len(), detached, "Applying cache effects");
                self.cache.apply(&commands);
                Ok(response)
            }
            Err(error) => {
                warn!(operation, error = %error, "Failed to {operation}");
                Err(error)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Cache maintenance
    // -------------------------------------------------------------------------

    /// Mark `prefix` and everything under it stale
    ///
    /// Reads under `prefix` that are still in flight are detached.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        self.in_flight.forget(|key| key.starts_with(prefix));
        self.cache.invalidate(prefix)
    }

    /// Drop entries idle for longer than the configured gc time
    pub fn collect_garbage(&self) -> usize {
        let removed = self.cache.collect_garbage(self.config.gc_time);
        if removed > 0 {
            debug!(removed, "Collected idle cache entries");
        }
        removed
    }
}

/// Fetch under the read policy and store the payload
///
/// The payload is stored stale when the key was invalidated while fetching.
async fn load<T, F, Fut>(
    cache: Arc<QueryCache>,
    policy: RetryPolicy,
    key: QueryKey,
    stale_time: Duration,
    fetch: F,
) -> SharedResult
where
    T: Serialize,
    F: Fn() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let label = key.to_string();
    let since = cache.generation();
    let data = with_retry(&policy, &label, fetch).await.map_err(Arc::new)?;
    let value = serde_json::to_value(&data).map_err(|e| Arc::new(ApiError::Json(e)))?;

    let written = cache.set_fetched(&key, value.clone(), stale_time, since);
    if written != FetchedWrite::Fresh {
        debug!(key = %label, ?written, "Fetched value overtaken by a write");
    }
    Ok(value)
}

fn decode<T: DeserializeOwned>(key: &QueryKey, value: Value) -> QueryState<T> {
    match serde_json::from_value(value) {
        Ok(data) => QueryState::Ready(data),
        Err(e) => {
            warn!(key = %key, error = %e, "Cached value has an unexpected shape");
            QueryState::Failed(Arc::new(ApiError::Json(e)))
        }
    }
}

/// Run `attempt` until it succeeds or `policy` gives up
pub(crate) async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, attempt: F) -> ApiResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let mut retries_done = 0;

    loop {
        let start = Instant::now();
        match attempt().await {
            Ok(value) => {
                debug!(
                    operation,
                    attempt = retries_done + 1,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Request succeeded"
                );
                return Ok(value);
            }
            Err(e) => {
                let class = e.failure_class();
                if !policy.should_retry(retries_done, class) {
                    debug!(
                        operation,
                        attempt = retries_done + 1,
                        error = %e,
                        "Request failed, not retrying"
                    );
                    return Err(e);
                }

                let delay = policy.delay_for_retry(retries_done);
                debug!(
                    operation,
                    attempt = retries_done + 1,
                    delay_ms = delay.as_millis(),
                    error = %e,
                    "Request failed, will retry"
                );
                tokio::time::sleep(delay).await;
                retries_done += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn failing_then_ok(
        calls: &Arc<AtomicU32>,
        failures: u32,
        status: u16,
    ) -> impl Fn() -> futures::future::Ready<ApiResult<u32>> {
        let calls = Arc::clone(calls);
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(if n < failures {
                Err(ApiError::api(status, "boom"))
            } else {
                Ok(n)
            })
        }
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::reads().quick();

        let result = with_retry(&policy, "test", failing_then_ok(&calls, 2, 503)).await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_policy() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::reads().quick();

        let result = with_retry(&policy, "test", failing_then_ok(&calls, 10, 500)).await;
        assert!(result.unwrap_err().is_server_error());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_no_retry_on_not_found() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::reads().quick();

        let result = with_retry(&policy, "test", failing_then_ok(&calls, 10, 404)).await;
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_throttled_retried_twice() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::reads().quick();

        let result = with_retry(&policy, "test", failing_then_ok(&calls, 10, 429)).await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_no_retry_policy_fails_fast() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::no_retry();

        let result = tokio_test::block_on(with_retry(&policy, "test", failing_then_ok(&calls, 1, 503)));
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_writes_retry_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::writes().quick();

        let result = with_retry(&policy, "test", failing_then_ok(&calls, 10, 502)).await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
