//! Author queries and mutations

use crate::error::ApiResult;
use crate::keys::{authors, books};
use crate::models::{Author, AuthorCreateRequest};
use crate::query::{QueryClient, QueryOptions, QueryState};
use libris_core::cache::{CacheCommand, CacheTime};

/// Author reads and writes
#[derive(Clone)]
pub struct AuthorQueries {
    client: QueryClient,
}

impl AuthorQueries {
    pub(crate) fn new(client: QueryClient) -> Self {
        Self { client }
    }

    /// All authors
    pub async fn all(&self) -> QueryState<Vec<Author>> {
        let api = self.client.api().authors();
        self.client
            .fetch(authors::lists(), QueryOptions::new(CacheTime::MEDIUM), move || {
                let api = api.clone();
                async move { api.get_all().await }
            })
            .await
    }

    /// One author; disabled without a positive id
    pub async fn detail(&self, id: Option<i64>) -> QueryState<Author> {
        let id = id.unwrap_or_default();
        let api = self.client.api().authors();
        let options = QueryOptions::new(CacheTime::MEDIUM).enabled(id > 0);
        self.client
            .fetch(authors::detail(id), options, move || {
                let api = api.clone();
                async move { api.get(id).await }
            })
            .await
    }

    /// One author with their books; disabled without a positive id
    pub async fn with_books(&self, id: Option<i64>) -> QueryState<Author> {
        let id = id.unwrap_or_default();
        let api = self.client.api().authors();
        let options = QueryOptions::new(CacheTime::MEDIUM).enabled(id > 0);
        self.client
            .fetch(authors::detail_with_books(id), options, move || {
                let api = api.clone();
                async move { api.get_with_books(id).await }
            })
            .await
    }

    /// Name search; disabled for a blank name
    pub async fn search_by_name(&self, name: &str) -> QueryState<Vec<Author>> {
        let name = name.trim().to_string();
        let api = self.client.api().authors();
        let options = QueryOptions::new(CacheTime::SHORT).enabled(!name.is_empty());
        self.client
            .fetch(authors::search(&name), options, move || {
                let api = api.clone();
                let name = name.clone();
                async move { api.search_by_name(&name).await }
            })
            .await
    }

    /// Authors of one nationality; disabled for a blank nationality
    pub async fn by_nationality(&self, nationality: &str) -> QueryState<Vec<Author>> {
        let nationality = nationality.trim().to_string();
        let api = self.client.api().authors();
        let options = QueryOptions::new(CacheTime::MEDIUM).enabled(!nationality.is_empty());
        self.client
            .fetch(authors::by_nationality(&nationality), options, move || {
                let api = api.clone();
                let nationality = nationality.clone();
                async move { api.by_nationality(&nationality).await }
            })
            .await
    }

    /// Create an author
    pub async fn create(&self, request: &AuthorCreateRequest) -> ApiResult<Author> {
        let api = self.client.api().authors();
        self.client
            .mutate_once("create author", || api.create(request), create_effects)
            .await
    }

    /// Update an author
    pub async fn update(&self, id: i64, request: &AuthorCreateRequest) -> ApiResult<Author> {
        let api = self.client.api().authors();
        self.client
            .mutate(
                "update author",
                || api.update(id, request),
                |author| update_effects(id, author),
            )
            .await
    }

    /// Delete an author
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let api = self.client.api().authors();
        self.client
            .mutate("delete author", || api.delete(id), |_| delete_effects(id))
            .await
    }
}

/// Every key that lists authors
fn collections() -> [CacheCommand; 3] {
    [
        CacheCommand::Invalidate(authors::lists()),
        CacheCommand::Invalidate(authors::searches()),
        CacheCommand::Invalidate(authors::nationalities()),
    ]
}

/// Cache effects of a successful create
#[must_use]
pub fn create_effects(created: &Author) -> Vec<CacheCommand> {
    let mut commands = vec![CacheCommand::replace(authors::detail(created.id), created)];
    commands.extend(collections());
    commands
}

/// Cache effects of a successful update
///
/// Books carry the author's name, so book lists are refreshed too.
#[must_use]
pub fn update_effects(id: i64, updated: &Author) -> Vec<CacheCommand> {
    let mut commands = vec![CacheCommand::replace(authors::detail(id), updated)];
    commands.extend(collections());
    commands.push(CacheCommand::Invalidate(authors::detail_with_books(id)));
    commands.push(CacheCommand::Invalidate(books::lists()));
    commands
}

/// Cache effects of a successful delete
#[must_use]
pub fn delete_effects(id: i64) -> Vec<CacheCommand> {
    vec![
        CacheCommand::Remove(authors::detail(id)),
        CacheCommand::Invalidate(authors::all()),
    ]
}
