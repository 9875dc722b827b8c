//! Request de-duplication
//!
//! [`SingleFlight`] keeps at most one in-flight run per key. A caller that
//! arrives while a run for its key is still going joins it and receives a clone
//! of the same output instead of starting a second request.
//!
//! Each run is driven by its own tokio task, so it completes and leaves the
//! registry even when every caller waiting on it has been dropped. The next call
//! after completion starts a fresh run.
//!
//! [`SingleFlight::forget`] detaches runs from their keys. A detached run keeps
//! going for the callers already waiting on it, but new callers start over.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::trace;

/// A run ended without producing an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlightAborted {
    /// The work panicked
    #[error("in-flight request panicked")]
    Panicked,
    /// The runtime cancelled the work
    #[error("in-flight request was cancelled")]
    Cancelled,
}

impl From<JoinError> for FlightAborted {
    fn from(error: JoinError) -> Self {
        if error.is_panic() {
            Self::Panicked
        } else {
            Self::Cancelled
        }
    }
}

type Output<V> = Shared<BoxFuture<'static, Result<V, FlightAborted>>>;

struct Flight<V> {
    id: u64,
    output: Output<V>,
}

struct Registry<K, V> {
    flights: HashMap<K, Flight<V>>,
    next_id: u64,
}

/// Removes a finished run from the registry unless it was replaced meanwhile
struct Landing<K, V>
where
    K: Eq + Hash,
{
    registry: Arc<Mutex<Registry<K, V>>>,
    key: K,
    id: u64,
}

impl<K, V> Drop for Landing<K, V>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        let mut registry = lock(&self.registry);
        if registry.flights.get(&self.key).is_some_and(|flight| flight.id == self.id) {
            registry.flights.remove(&self.key);
        }
    }
}

/// Coalesces concurrent work sharing a key
pub struct SingleFlight<K, V> {
    registry: Arc<Mutex<Registry<K, V>>>,
}

impl<K, V> Clone for SingleFlight<K, V> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                flights: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Run `make()` for `key`, or join the run already in flight for it
    ///
    /// `make` is only called when no run for `key` is in flight. The run is
    /// spawned on the current tokio runtime and finishes even if this call is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`FlightAborted`] when the run panicked or was cancelled.
    pub async fn run<F, Fut>(&self, key: K, make: F) -> Result<V, FlightAborted>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let output = {
            let mut registry = lock(&self.registry);

            if let Some(existing) = registry.flights.get(&key) {
                trace!("Joining in-flight request");
                existing.output.clone()
            } else {
                registry.next_id += 1;
                let id = registry.next_id;
                let landing = Landing {
                    registry: Arc::clone(&self.registry),
                    key: key.clone(),
                    id,
                };
                let work = make();

                let task = tokio::spawn(async move {
                    let _landing = landing;
                    work.await
                });
                let output = async move { task.await.map_err(FlightAborted::from) }
                    .boxed()
                    .shared();

                registry.flights.insert(
                    key,
                    Flight {
                        id,
                        output: output.clone(),
                    },
                );
                output
            }
        };

        output.await
    }

    /// Detach every run whose key matches `predicate`, returning how many
    pub fn forget(&self, predicate: impl Fn(&K) -> bool) -> usize {
        let mut registry = lock(&self.registry);
        let before = registry.flights.len();
        registry.flights.retain(|key, _| !predicate(key));
        before - registry.flights.len()
    }

    /// Whether a run for `key` is currently in flight
    #[must_use]
    pub fn is_in_flight(&self, key: &K) -> bool {
        lock(&self.registry).flights.contains_key(key)
    }

    /// Number of keys with a run in flight
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.registry).flights.len()
    }

    /// Whether nothing is in flight
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn counting(calls: &Arc<AtomicU32>, value: u32) -> impl FnOnce() -> BoxFuture<'static, u32> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                value
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_concurrent_calls_coalesce() {
        let flight = SingleFlight::<&'static str, u32>::new();
        let calls = Arc::new(AtomicU32::new(0));

        let (a, b) = tokio::join!(
            flight.run("books", counting(&calls, 7)),
            flight.run("books", counting(&calls, 8)),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!((a, b), (Ok(7), Ok(7)));
        assert!(flight.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_keys_run_separately() {
        let flight = SingleFlight::<&'static str, u32>::new();
        let calls = Arc::new(AtomicU32::new(0));

        let (a, b) = tokio::join!(
            flight.run("books", counting(&calls, 1)),
            flight.run("members", counting(&calls, 2)),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!((a, b), (Ok(1), Ok(2)));
    }

    #[tokio::test]
    async fn test_sequential_calls_run_again() {
        let flight = SingleFlight::<&'static str, u32>::new();
        let calls = Arc::new(AtomicU32::new(0));

        flight.run("books", counting(&calls, 1)).await.unwrap();
        flight.run("books", counting(&calls, 1)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_in_flight_visibility() {
        let flight = SingleFlight::<&'static str, u32>::new();
        let calls = Arc::new(AtomicU32::new(0));
        let observer = flight.clone();

        let run = flight.run("books", counting(&calls, 3));
        let check = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            observer.is_in_flight(&"books")
        };

        let (value, seen) = tokio::join!(run, check);
        assert_eq!(value, Ok(3));
        assert!(seen);
        assert!(!flight.is_in_flight(&"books"));
    }

    #[tokio::test]
    async fn test_dropped_caller_does_not_stall_key() {
        let flight = SingleFlight::<&'static str, u32>::new();
        let calls = Arc::new(AtomicU32::new(0));

        let abandoned = tokio::time::timeout(
            Duration::from_millis(5),
            flight.run("books", counting(&calls, 1)),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(flight.is_in_flight(&"books"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(flight.is_empty());

        let next = flight.run("books", counting(&calls, 2)).await;
        assert_eq!(next, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_forget_starts_a_new_run() {
        let flight = SingleFlight::<&'static str, u32>::new();
        let calls = Arc::new(AtomicU32::new(0));
        let detacher = flight.clone();

        let old = flight.run("books", counting(&calls, 1));
        let new = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert_eq!(detacher.forget(|key| *key == "books"), 1);
            detacher
                .run("books", || async {
                    tokio::time::sleep(Duration::from_millis(40)).await;
                    2
                })
                .await
        };
        let check = async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            flight.is_in_flight(&"books")
        };

        let (old, new, newer_still_tracked) = tokio::join!(old, new, check);
        assert_eq!(old, Ok(1));
        assert_eq!(new, Ok(2));
        assert!(newer_still_tracked);
        assert!(flight.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_run_reports_abort() {
        let flight = SingleFlight::<&'static str, u32>::new();

        let result = flight
            .run("books", || async {
                let reply: Option<u32> = None;
                reply.expect("lost connection")
            })
            .await;

        assert_eq!(result, Err(FlightAborted::Panicked));
        assert!(flight.is_empty());
    }
}
