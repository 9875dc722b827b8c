//! In-memory query cache
//!
//! Stores JSON payloads under [`QueryKey`]s together with the time they were
//! written and the staleness window they were written with:
//!
//! - a **fresh** entry is served without I/O
//! - a **stale** entry (older than its window, or explicitly invalidated) is kept
//!   but the next read refetches it
//! - entries untouched for longer than the gc time are dropped by
//!   [`QueryCache::collect_garbage`]
//!
//! Writes after a mutation are expressed as [`CacheCommand`]s and applied with
//! [`QueryCache::apply`]. `Invalidate` and `Remove` act on every key under the
//! given prefix.
//!
//! # Example
//!
//! ```rust
//! use libris_core::cache::{CacheCommand, CacheTime, QueryCache};
//! use libris_core::key::QueryKey;
//!
//! let cache = QueryCache::new();
//! let detail = QueryKey::root("members").push("detail").push(9_i64);
//! cache.set_data(&detail, &"Ada", CacheTime::MEDIUM);
//!
//! cache.apply(&[CacheCommand::Remove(detail.clone())]);
//! assert!(!cache.contains(&detail));
//! ```

use crate::key::QueryKey;
use crate::retry::RetryPolicy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Common staleness windows
pub struct CacheTime;

impl CacheTime {
    /// Volatile reads: searches, current borrowings, overdue lists
    pub const SHORT: Duration = Duration::from_secs(2 * 60);
    /// Default for lists and details
    pub const MEDIUM: Duration = Duration::from_secs(5 * 60);
    /// Historical data that rarely changes
    pub const LONG: Duration = Duration::from_secs(10 * 60);
}

/// Defaults for the query layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Staleness window used when a read does not declare one
    pub stale_time: Duration,
    /// Entries untouched for this long are garbage collected
    pub gc_time: Duration,
    /// Retry policy for reads
    pub reads: RetryPolicy,
    /// Retry policy for writes
    pub writes: RetryPolicy,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: CacheTime::MEDIUM,
            gc_time: CacheTime::LONG,
            reads: RetryPolicy::reads(),
            writes: RetryPolicy::writes(),
        }
    }
}

impl QueryConfig {
    /// Configuration without any retries
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            reads: RetryPolicy::no_retry(),
            writes: RetryPolicy::no_retry(),
            ..Self::default()
        }
    }

    /// Builder-style method to set the read retry policy
    #[must_use]
    pub fn with_reads(mut self, reads: RetryPolicy) -> Self {
        self.reads = reads;
        self
    }

    /// Builder-style method to set the write retry policy
    #[must_use]
    pub fn with_writes(mut self, writes: RetryPolicy) -> Self {
        self.writes = writes;
        self
    }
}

/// A cache update produced after a successful write
#[derive(Debug, Clone, PartialEq)]
pub enum CacheCommand {
    /// Store a fresh value under exactly this key
    Replace(QueryKey, Value),
    /// Mark this key and every key under it stale
    Invalidate(QueryKey),
    /// Drop this key and every key under it
    Remove(QueryKey),
}

impl CacheCommand {
    /// Build a `Replace` from any serializable value
    ///
    /// A value that cannot be serialized degrades to `Invalidate` for the same
    /// key, so the next read refetches it instead of serving an old copy.
    pub fn replace<T: Serialize>(key: QueryKey, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(json) => Self::Replace(key, json),
            Err(e) => {
                warn!(key = %key, error = %e, "Could not serialize cache value, invalidating instead");
                Self::Invalidate(key)
            }
        }
    }

    /// The key this command targets
    #[must_use]
    pub fn key(&self) -> &QueryKey {
        match self {
            Self::Replace(key, _) | Self::Invalidate(key) | Self::Remove(key) => key,
        }
    }

    /// Whether applying this command changes what is cached under `key`
    #[must_use]
    pub fn covers(&self, key: &QueryKey) -> bool {
        match self {
            Self::Replace(target, _) => target == key,
            Self::Invalidate(prefix) | Self::Remove(prefix) => key.starts_with(prefix),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    updated_at: Instant,
    last_access: Instant,
    stale_time: Duration,
    invalidated: bool,
    generation: u64,
}

impl CacheEntry {
    fn new(value: Value, stale_time: Duration, generation: u64) -> Self {
        let now = Instant::now();
        Self {
            value,
            updated_at: now,
            last_access: now,
            stale_time,
            invalidated: false,
            generation,
        }
    }

    fn is_stale(&self) -> bool {
        self.invalidated || self.updated_at.elapsed() >= self.stale_time
    }
}

/// Last invalidation or removal of one prefix
#[derive(Debug, Clone, Copy)]
struct Mark {
    generation: u64,
    at: Instant,
}

#[derive(Debug, Default)]
struct Store {
    entries: HashMap<QueryKey, CacheEntry>,
    marks: HashMap<QueryKey, Mark>,
    generation: u64,
}

impl Store {
    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn mark(&mut self, prefix: &QueryKey) {
        let generation = self.bump();
        self.marks.insert(
            prefix.clone(),
            Mark {
                generation,
                at: Instant::now(),
            },
        );
    }

    /// Whether an invalidation or removal covering `key` happened after `since`
    fn marked_since(&self, key: &QueryKey, since: u64) -> bool {
        key.ancestors()
            .filter_map(|prefix| self.marks.get(&prefix))
            .any(|mark| mark.generation > since)
    }
}

/// How [`QueryCache::set_fetched`] stored a fetched value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchedWrite {
    /// Stored as fresh
    Fresh,
    /// Stored, but already stale: the key was invalidated while the fetch ran
    Stale,
    /// Not stored: the key was written with newer data while the fetch ran
    Superseded,
}

/// A cached value with its freshness at read time
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// The cached payload
    pub value: Value,
    /// Whether the next read should refetch
    pub stale: bool,
    /// Time since the value was written
    pub age: Duration,
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of entries
    pub total_entries: usize,
    /// Number of stale or invalidated entries
    pub stale_entries: usize,
}

/// Shared, keyed payload store
///
/// Share it between callers behind an `Arc`; all methods take `&self`.
///
/// Every write, invalidation and removal advances a generation counter. A fetch
/// captures [`QueryCache::generation`] before it starts and stores its result
/// with [`QueryCache::set_fetched`], which refuses to present the result as
/// fresh when the key was invalidated or rewritten in the meantime.
pub struct QueryCache {
    store: RwLock<Store>,
    default_stale_time: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    /// Create an empty cache with the medium staleness window as default
    #[must_use]
    pub fn new() -> Self {
        Self::with_stale_time(CacheTime::MEDIUM)
    }

    /// Create an empty cache with a specific default staleness window
    #[must_use]
    pub fn with_stale_time(default_stale_time: Duration) -> Self {
        Self {
            store: RwLock::new(Store::default()),
            default_stale_time,
        }
    }

    /// Current generation; capture it before fetching a key
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Read a key, refreshing its last-access time
    pub fn snapshot(&self, key: &QueryKey) -> Option<Snapshot> {
        let mut store = self.write();
        let entry = store.entries.get_mut(key)?;
        entry.last_access = Instant::now();

        Some(Snapshot {
            value: entry.value.clone(),
            stale: entry.is_stale(),
            age: entry.updated_at.elapsed(),
        })
    }

    /// Read and decode a key regardless of freshness
    pub fn get_data<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let snapshot = self.snapshot(key)?;
        match serde_json::from_value(snapshot.value) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "Cached value has an unexpected shape");
                None
            }
        }
    }

    /// Store a fresh value
    pub fn set(&self, key: &QueryKey, value: Value, stale_time: Duration) {
        let mut store = self.write();
        let generation = store.bump();
        store
            .entries
            .insert(key.clone(), CacheEntry::new(value, stale_time, generation));
    }

    /// Store the result of a fetch that started at generation `since`
    ///
    /// A value written to `key` after `since` wins over the fetched one. An
    /// invalidation or removal covering `key` after `since` stores the fetched
    /// value already stale, so the next read refetches.
    pub fn set_fetched(&self, key: &QueryKey, value: Value, stale_time: Duration, since: u64) -> FetchedWrite {
        let mut store = self.write();

        if store.entries.get(key).is_some_and(|entry| entry.generation > since) {
            debug!(key = %key, "Fetched value superseded by a newer write");
            return FetchedWrite::Superseded;
        }

        let stale = store.marked_since(key, since);
        let generation = store.bump();
        let mut entry = CacheEntry::new(value, stale_time, generation);
        entry.invalidated = stale;
        store.entries.insert(key.clone(), entry);

        if stale {
            debug!(key = %key, "Key invalidated during fetch, stored as stale");
            FetchedWrite::Stale
        } else {
            FetchedWrite::Fresh
        }
    }

    /// Serialize and store a fresh value
    ///
    /// Returns false when the value could not be serialized; the cache is then
    /// left unchanged.
    pub fn set_data<T: Serialize>(&self, key: &QueryKey, value: &T, stale_time: Duration) -> bool {
        match serde_json::to_value(value) {
            Ok(json) => {
                self.set(key, json, stale_time);
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Could not serialize cache value");
                false
            }
        }
    }

    /// Whether a key holds a value
    #[must_use]
    pub fn contains(&self, key: &QueryKey) -> bool {
        self.read().entries.contains_key(key)
    }

    /// Whether a read of `key` would refetch; missing keys count as stale
    #[must_use]
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.read().entries.get(key).map_or(true, CacheEntry::is_stale)
    }

    /// Mark every key under `prefix` stale, returning how many were marked
    ///
    /// Fetches of keys under `prefix` that are still running will store their
    /// results as stale.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut store = self.write();
        store.mark(prefix);

        let mut marked = 0;
        for (key, entry) in &mut store.entries {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                marked += 1;
            }
        }
        debug!(prefix = %prefix, marked, "Invalidated queries");
        marked
    }

    /// Drop every key under `prefix`, returning how many were dropped
    pub fn remove(&self, prefix: &QueryKey) -> usize {
        let mut store = self.write();
        store.mark(prefix);

        let before = store.entries.len();
        store.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - store.entries.len();
        debug!(prefix = %prefix, removed, "Removed queries");
        removed
    }

    /// Apply post-mutation commands in order
    pub fn apply(&self, commands: &[CacheCommand]) {
        for command in commands {
            match command {
                CacheCommand::Replace(key, value) => {
                    let stale_time = self
                        .read()
                        .entries
                        .get(key)
                        .map_or(self.default_stale_time, |entry| entry.stale_time);
                    self.set(key, value.clone(), stale_time);
                }
                CacheCommand::Invalidate(prefix) => {
                    self.invalidate(prefix);
                }
                CacheCommand::Remove(prefix) => {
                    self.remove(prefix);
                }
            }
        }
    }

    /// Drop entries nobody has read or written for `gc_time`
    ///
    /// Invalidation marks older than `gc_time` are dropped as well.
    pub fn collect_garbage(&self, gc_time: Duration) -> usize {
        let mut store = self.write();
        store.marks.retain(|_, mark| mark.at.elapsed() < gc_time);

        let before = store.entries.len();
        store.entries.retain(|_, entry| entry.last_access.elapsed() < gc_time);
        before - store.entries.len()
    }

    /// All keys, sorted
    #[must_use]
    pub fn keys(&self) -> Vec<QueryKey> {
        let mut keys: Vec<QueryKey> = self.read().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    /// Whether the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.write().entries.clear();
    }

    /// Entry counts
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let store = self.read();
        CacheStats {
            total_entries: store.entries.len(),
            stale_entries: store.entries.values().filter(|e| e.is_stale()).count(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn books() -> QueryKey {
        QueryKey::root("books")
    }

    fn book_list() -> QueryKey {
        books().push("list")
    }

    fn book_detail(id: i64) -> QueryKey {
        books().push("detail").push(id)
    }

    #[test]
    fn test_set_and_get() {
        let cache = QueryCache::new();
        cache.set_data(&book_detail(1), &json!({"id": 1}), CacheTime::MEDIUM);

        let value: Option<Value> = cache.get_data(&book_detail(1));
        assert_eq!(value, Some(json!({"id": 1})));
        assert!(!cache.is_stale(&book_detail(1)));
    }

    #[test]
    fn test_get_missing() {
        let cache = QueryCache::new();
        assert!(cache.get_data::<Value>(&book_list()).is_none());
        assert!(cache.is_stale(&book_list()));
    }

    #[test]
    fn test_zero_stale_time_is_immediately_stale() {
        let cache = QueryCache::new();
        cache.set(&book_list(), json!([]), Duration::ZERO);
        assert!(cache.is_stale(&book_list()));
        assert!(cache.snapshot(&book_list()).unwrap().stale);
    }

    #[test]
    fn test_invalidate_marks_prefix_only() {
        let cache = QueryCache::new();
        cache.set(&book_list(), json!([]), CacheTime::MEDIUM);
        cache.set(&book_detail(1), json!({}), CacheTime::MEDIUM);
        cache.set(&QueryKey::root("members").push("list"), json!([]), CacheTime::MEDIUM);

        assert_eq!(cache.invalidate(&book_list()), 1);
        assert!(cache.is_stale(&book_list()));
        assert!(!cache.is_stale(&book_detail(1)));

        assert_eq!(cache.invalidate(&books()), 2);
        assert!(!cache.is_stale(&QueryKey::root("members").push("list")));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_invalidate_is_idempotent() {
        let cache = QueryCache::new();
        cache.set(&book_list(), json!([1]), CacheTime::MEDIUM);

        cache.invalidate(&book_list());
        cache.invalidate(&book_list());

        assert!(cache.is_stale(&book_list()));
        assert_eq!(cache.get_data::<Value>(&book_list()), Some(json!([1])));
    }

    #[test]
    fn test_remove_prefix() {
        let cache = QueryCache::new();
        let with_books = book_detail(1).push("borrowed-books");
        cache.set(&book_detail(1), json!({}), CacheTime::MEDIUM);
        cache.set(&with_books, json!({}), CacheTime::MEDIUM);
        cache.set(&book_detail(10), json!({}), CacheTime::MEDIUM);

        assert_eq!(cache.remove(&book_detail(1)), 2);
        assert!(cache.contains(&book_detail(10)));
    }

    #[test]
    fn test_apply_commands_in_order() {
        let cache = QueryCache::new();
        cache.set(&book_list(), json!([]), CacheTime::SHORT);
        cache.set(&book_detail(2), json!({"id": 2}), CacheTime::SHORT);

        cache.apply(&[
            CacheCommand::replace(book_detail(3), &json!({"id": 3})),
            CacheCommand::Invalidate(book_list()),
            CacheCommand::Remove(book_detail(2)),
        ]);

        assert_eq!(cache.get_data::<Value>(&book_detail(3)), Some(json!({"id": 3})));
        assert!(!cache.is_stale(&book_detail(3)));
        assert!(cache.is_stale(&book_list()));
        assert!(!cache.contains(&book_detail(2)));
    }

    #[test]
    fn test_replace_clears_invalidation() {
        let cache = QueryCache::new();
        cache.set(&book_detail(1), json!({"v": 1}), CacheTime::MEDIUM);
        cache.invalidate(&books());

        cache.apply(&[CacheCommand::Replace(book_detail(1), json!({"v": 2}))]);

        assert!(!cache.is_stale(&book_detail(1)));
        assert_eq!(cache.get_data::<Value>(&book_detail(1)), Some(json!({"v": 2})));
    }

    #[test]
    fn test_get_data_wrong_shape() {
        let cache = QueryCache::new();
        cache.set(&book_list(), json!("not a list"), CacheTime::MEDIUM);
        assert!(cache.get_data::<Vec<i64>>(&book_list()).is_none());
    }

    #[test]
    fn test_collect_garbage() {
        let cache = QueryCache::new();
        cache.set(&book_list(), json!([]), CacheTime::MEDIUM);

        assert_eq!(cache.collect_garbage(CacheTime::LONG), 0);
        assert_eq!(cache.collect_garbage(Duration::ZERO), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stats_and_keys() {
        let cache = QueryCache::new();
        cache.set(&book_detail(2), json!({}), CacheTime::MEDIUM);
        cache.set(&book_detail(1), json!({}), Duration::ZERO);

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.stale_entries, 1);
        assert_eq!(cache.keys(), vec![book_detail(1), book_detail(2)]);

        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_fetch_started_before_invalidation_is_stored_stale() {
        let cache = QueryCache::new();
        let since = cache.generation();

        cache.invalidate(&books());
        let outcome = cache.set_fetched(&book_list(), json!([1]), CacheTime::MEDIUM, since);

        assert_eq!(outcome, FetchedWrite::Stale);
        assert!(cache.is_stale(&book_list()));
        assert_eq!(cache.get_data::<Value>(&book_list()), Some(json!([1])));
    }

    #[test]
    fn test_fetch_after_invalidation_is_fresh() {
        let cache = QueryCache::new();
        cache.invalidate(&books());
        let since = cache.generation();

        let outcome = cache.set_fetched(&book_list(), json!([1, 2]), CacheTime::MEDIUM, since);

        assert_eq!(outcome, FetchedWrite::Fresh);
        assert!(!cache.is_stale(&book_list()));
    }

    #[test]
    fn test_unrelated_invalidation_keeps_fetch_fresh() {
        let cache = QueryCache::new();
        let since = cache.generation();

        cache.invalidate(&QueryKey::root("members"));
        cache.invalidate(&book_detail(1));
        let outcome = cache.set_fetched(&book_list(), json!([]), CacheTime::MEDIUM, since);

        assert_eq!(outcome, FetchedWrite::Fresh);
    }

    #[test]
    fn test_removal_during_fetch_is_stored_stale() {
        let cache = QueryCache::new();
        let since = cache.generation();

        cache.remove(&book_detail(4));
        let outcome = cache.set_fetched(&book_detail(4), json!({"id": 4}), CacheTime::MEDIUM, since);

        assert_eq!(outcome, FetchedWrite::Stale);
        assert!(cache.is_stale(&book_detail(4)));
    }

    #[test]
    fn test_replace_during_fetch_wins() {
        let cache = QueryCache::new();
        let since = cache.generation();

        cache.apply(&[CacheCommand::Replace(book_detail(5), json!({"v": "new"}))]);
        let outcome = cache.set_fetched(&book_detail(5), json!({"v": "old"}), CacheTime::MEDIUM, since);

        assert_eq!(outcome, FetchedWrite::Superseded);
        assert_eq!(cache.get_data::<Value>(&book_detail(5)), Some(json!({"v": "new"})));
        assert!(!cache.is_stale(&book_detail(5)));
    }

    #[test]
    fn test_old_marks_are_collected() {
        let cache = QueryCache::new();
        let since = cache.generation();
        cache.invalidate(&books());

        cache.collect_garbage(Duration::ZERO);
        let outcome = cache.set_fetched(&book_list(), json!([]), CacheTime::MEDIUM, since);

        assert_eq!(outcome, FetchedWrite::Fresh);
    }

    #[test]
    fn test_command_key() {
        let command = CacheCommand::Invalidate(book_list());
        assert_eq!(command.key(), &book_list());
    }

    #[test]
    fn test_command_coverage() {
        let invalidate = CacheCommand::Invalidate(books());
        assert!(invalidate.covers(&book_list()));
        assert!(invalidate.covers(&book_detail(1)));
        assert!(!invalidate.covers(&QueryKey::root("members")));

        let replace = CacheCommand::Replace(book_detail(1), json!({}));
        assert!(replace.covers(&book_detail(1)));
        assert!(!replace.covers(&book_detail(10)));
        assert!(!replace.covers(&book_list()));
    }
}
