//! Book queries and mutations

use crate::error::ApiResult;
use crate::keys::{authors, books};
use crate::models::{Book, BookCreateRequest, BookFilters, BookSearch, BookSummary};
use crate::query::{QueryClient, QueryOptions, QueryState};
use libris_core::cache::{CacheCommand, CacheTime};

/// Book reads and writes
#[derive(Clone)]
pub struct BookQueries {
    client: QueryClient,
}

impl BookQueries {
    pub(crate) fn new(client: QueryClient) -> Self {
        Self { client }
    }

    /// Every book
    pub async fn all(&self) -> QueryState<Vec<Book>> {
        self.list(&BookFilters::default()).await
    }

    /// A filtered or paginated list
    pub async fn list(&self, filters: &BookFilters) -> QueryState<Vec<Book>> {
        let api = self.client.api().books();
        let filters = filters.clone();
        self.client
            .fetch(books::list(&filters), QueryOptions::new(CacheTime::MEDIUM), move || {
                let api = api.clone();
                let filters = filters.clone();
                async move { api.get_all(&filters).await }
            })
            .await
    }

    /// One book; disabled without a positive id
    pub async fn detail(&self, id: Option<i64>) -> QueryState<Book> {
        let id = id.unwrap_or_default();
        let options = QueryOptions::new(CacheTime::MEDIUM).enabled(id > 0);
        let api = self.client.api().books();
        self.client
            .fetch(books::detail(id), options, move || {
                let api = api.clone();
                async move { api.get(id).await }
            })
            .await
    }

    /// Warm the detail cache, e.g. when a row is hovered in a list
    pub async fn prefetch(&self, id: i64) -> bool {
        let api = self.client.api().books();
        let options = QueryOptions::new(CacheTime::MEDIUM).enabled(id > 0);
        self.client
            .prefetch(books::detail(id), options, move || {
                let api = api.clone();
                async move { api.get(id).await }
            })
            .await
    }

    /// Advanced search
    pub async fn search(&self, search: &BookSearch) -> QueryState<Vec<Book>> {
        let api = self.client.api().books();
        let search = search.clone();
        self.client
            .fetch(books::search(&search), QueryOptions::new(CacheTime::SHORT), move || {
                let api = api.clone();
                let search = search.clone();
                async move { api.search(&search).await }
            })
            .await
    }

    /// Books with copies on the shelf
    pub async fn available(&self) -> QueryState<Vec<Book>> {
        let api = self.client.api().books();
        self.client
            .fetch(books::available(), QueryOptions::new(CacheTime::MEDIUM), move || {
                let api = api.clone();
                async move { api.available().await }
            })
            .await
    }

    /// Books in one category; disabled for a blank category
    pub async fn by_category(&self, category: &str) -> QueryState<Vec<Book>> {
        let category = category.trim().to_string();
        let options = QueryOptions::new(CacheTime::MEDIUM).enabled(!category.is_empty());
        let api = self.client.api().books();
        self.client
            .fetch(books::by_category(&category), options, move || {
                let api = api.clone();
                let category = category.clone();
                async move { api.by_category(&category).await }
            })
            .await
    }

    /// Category names
    pub async fn categories(&self) -> QueryState<Vec<String>> {
        let api = self.client.api().books();
        self.client
            .fetch(books::categories(), QueryOptions::new(CacheTime::LONG), move || {
                let api = api.clone();
                async move { api.categories().await }
            })
            .await
    }

    /// Lightweight summaries; disabled until filters are given
    pub async fn summaries(&self, filters: Option<&BookFilters>) -> QueryState<Vec<BookSummary>> {
        let options = QueryOptions::new(CacheTime::MEDIUM).enabled(filters.is_some());
        let filters = filters.cloned().unwrap_or_default();
        let api = self.client.api().books();
        self.client
            .fetch(books::summaries(&filters), options, move || {
                let api = api.clone();
                let filters = filters.clone();
                async move { api.summaries(&filters).await }
            })
            .await
    }

    /// Create a book
    pub async fn create(&self, request: &BookCreateRequest) -> ApiResult<Book> {
        let api = self.client.api().books();
        self.client
            .mutate_once("create book", || api.create(request), saved_effects)
            .await
    }

    /// Update a book
    pub async fn update(&self, id: i64, request: &BookCreateRequest) -> ApiResult<Book> {
        let api = self.client.api().books();
        self.client
            .mutate("update book", || api.update(id, request), saved_effects)
            .await
    }

    /// Delete a book
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let api = self.client.api().books();
        self.client
            .mutate("delete book", || api.delete(id), |_| delete_effects(id))
            .await
    }
}

/// Cache effects of a successful create or update
///
/// The saved book replaces its detail entry. Every derived collection is
/// refreshed, along with every author detail: an update may have moved the book
/// away from an author this response no longer names.
#[must_use]
pub fn saved_effects(book: &Book) -> Vec<CacheCommand> {
    vec![
        CacheCommand::replace(books::detail(book.id), book),
        CacheCommand::Invalidate(books::lists()),
        CacheCommand::Invalidate(books::searches()),
        CacheCommand::Invalidate(books::available()),
        CacheCommand::Invalidate(books::category_lists()),
        CacheCommand::Invalidate(books::categories()),
        CacheCommand::Invalidate(books::summary_lists()),
        CacheCommand::Invalidate(authors::details()),
    ]
}

/// Cache effects of a successful delete
#[must_use]
pub fn delete_effects(id: i64) -> Vec<CacheCommand> {
    vec![
        CacheCommand::Remove(books::detail(id)),
        CacheCommand::Invalidate(books::all()),
        CacheCommand::Invalidate(authors::all()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_core::cache::QueryCache;
    use serde_json::json;
    use std::time::Duration;

    fn book(id: i64) -> Book {
        Book {
            id,
            title: "Kindred".into(),
            category: "Fiction".into(),
            publishing_year: 1979,
            isbn: None,
            description: None,
            total_copies: 3,
            available_copies: 2,
            author_id: 5,
            author_name: Some("Octavia E. Butler".into()),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_saved_effects_keep_detail_fresh() {
        let cache = QueryCache::new();
        let minute = Duration::from_secs(60);
        cache.set(&books::list(&BookFilters::default()), json!([]), minute);
        cache.set(&books::categories(), json!(["Fiction"]), minute);

        cache.apply(&saved_effects(&book(7)));

        assert!(!cache.is_stale(&books::detail(7)));
        assert_eq!(cache.get_data::<Book>(&books::detail(7)), Some(book(7)));
        assert!(cache.is_stale(&books::list(&BookFilters::default())));
        assert!(cache.is_stale(&books::categories()));
    }

    #[test]
    fn test_saved_effects_stale_previous_author() {
        let cache = QueryCache::new();
        let minute = Duration::from_secs(60);
        cache.set(&authors::detail_with_books(2), json!({"id": 2}), minute);
        cache.set(&authors::detail_with_books(5), json!({"id": 5}), minute);
        cache.set(&authors::all(), json!([]), minute);

        // moved from author 2 to author 5
        cache.apply(&saved_effects(&book(7)));

        assert!(cache.is_stale(&authors::detail_with_books(2)));
        assert!(cache.is_stale(&authors::detail_with_books(5)));
        assert!(!cache.is_stale(&authors::all()));
    }

    #[test]
    fn test_delete_effects() {
        let cache = QueryCache::new();
        cache.set(&books::detail(7), json!({}), Duration::from_secs(60));
        cache.set(&books::available(), json!([]), Duration::from_secs(60));

        cache.apply(&delete_effects(7));

        assert!(!cache.contains(&books::detail(7)));
        assert!(cache.is_stale(&books::available()));
    }
}
