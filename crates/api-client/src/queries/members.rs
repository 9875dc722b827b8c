//! Member queries and mutations

use crate::error::ApiResult;
use crate::keys::{borrowed_books, members};
use crate::models::{Member, MemberCreateRequest};
use crate::query::{QueryClient, QueryOptions, QueryState};
use libris_core::cache::{CacheCommand, CacheTime};

/// Member reads and writes
#[derive(Clone)]
pub struct MemberQueries {
    client: QueryClient,
}

impl MemberQueries {
    pub(crate) fn new(client: QueryClient) -> Self {
        Self { client }
    }

    /// Every member
    pub async fn all(&self) -> QueryState<Vec<Member>> {
        let api = self.client.api().members();
        self.client
            .fetch(members::lists(), QueryOptions::new(CacheTime::MEDIUM), move || {
                let api = api.clone();
                async move { api.get_all().await }
            })
            .await
    }

    /// One member; disabled without a positive id
    pub async fn detail(&self, id: Option<i64>) -> QueryState<Member> {
        let id = id.unwrap_or_default();
        let options = QueryOptions::new(CacheTime::MEDIUM).enabled(id > 0);
        let api = self.client.api().members();
        self.client
            .fetch(members::detail(id), options, move || {
                let api = api.clone();
                async move { api.get(id).await }
            })
            .await
    }

    /// One member with their borrowing records; disabled without a positive id
    pub async fn with_borrowed_books(&self, id: Option<i64>) -> QueryState<Member> {
        let id = id.unwrap_or_default();
        let options = QueryOptions::new(CacheTime::MEDIUM).enabled(id > 0);
        let api = self.client.api().members();
        self.client
            .fetch(members::detail_with_borrowed_books(id), options, move || {
                let api = api.clone();
                async move { api.get_with_borrowed_books(id).await }
            })
            .await
    }

    /// Warm the detail cache
    pub async fn prefetch(&self, id: i64) -> bool {
        let options = QueryOptions::new(CacheTime::MEDIUM).enabled(id > 0);
        let api = self.client.api().members();
        self.client
            .prefetch(members::detail(id), options, move || {
                let api = api.clone();
                async move { api.get(id).await }
            })
            .await
    }

    /// Search by name or e-mail; disabled for a blank term
    pub async fn search(&self, term: &str) -> QueryState<Vec<Member>> {
        let term = term.trim().to_string();
        let options = QueryOptions::new(CacheTime::SHORT).enabled(!term.is_empty());
        let api = self.client.api().members();
        self.client
            .fetch(members::search(&term), options, move || {
                let api = api.clone();
                let term = term.clone();
                async move { api.search(&term).await }
            })
            .await
    }

    /// Lookup by e-mail; disabled for a blank address
    pub async fn by_email(&self, email: &str) -> QueryState<Member> {
        let email = email.trim().to_string();
        let options = QueryOptions::new(CacheTime::MEDIUM).enabled(!email.is_empty());
        let api = self.client.api().members();
        self.client
            .fetch(members::by_email(&email), options, move || {
                let api = api.clone();
                let email = email.clone();
                async move { api.by_email(&email).await }
            })
            .await
    }

    /// Register a member
    pub async fn create(&self, request: &MemberCreateRequest) -> ApiResult<Member> {
        let api = self.client.api().members();
        self.client
            .mutate_once("create member", || api.create(request), create_effects)
            .await
    }

    /// Update a member
    pub async fn update(&self, id: i64, request: &MemberCreateRequest) -> ApiResult<Member> {
        let api = self.client.api().members();
        self.client
            .mutate(
                "update member",
                || api.update(id, request),
                |member| update_effects(id, member),
            )
            .await
    }

    /// Delete a member
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let api = self.client.api().members();
        self.client
            .mutate("delete member", || api.delete(id), |_| delete_effects(id))
            .await
    }
}

/// Cache effects of a successful create
#[must_use]
pub fn create_effects(created: &Member) -> Vec<CacheCommand> {
    vec![
        CacheCommand::replace(members::detail(created.id), created),
        CacheCommand::Invalidate(members::lists()),
        CacheCommand::Invalidate(members::searches()),
    ]
}

/// Cache effects of a successful update
///
/// Borrowing records embed the member's name and e-mail, so they are refreshed too.
#[must_use]
pub fn update_effects(id: i64, updated: &Member) -> Vec<CacheCommand> {
    vec![
        CacheCommand::replace(members::detail(id), updated),
        CacheCommand::Invalidate(members::lists()),
        CacheCommand::Invalidate(members::searches()),
        CacheCommand::Invalidate(members::emails()),
        CacheCommand::Invalidate(members::detail_with_borrowed_books(id)),
        CacheCommand::Invalidate(borrowed_books::lists()),
    ]
}

/// Cache effects of a successful delete
#[must_use]
pub fn delete_effects(id: i64) -> Vec<CacheCommand> {
    vec![
        CacheCommand::Remove(members::detail(id)),
        CacheCommand::Invalidate(members::all()),
        CacheCommand::Remove(borrowed_books::member(id)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MembershipStatus;
    use libris_core::cache::QueryCache;
    use serde_json::json;
    use std::time::Duration;

    fn member(id: i64) -> Member {
        Member {
            id,
            name: "Ada Lovelace".into(),
            email: "ada@example.org".into(),
            phone: None,
            address: None,
            membership_date: Some("2024-01-15".into()),
            membership_status: Some(MembershipStatus::Active),
            created_at: None,
            updated_at: None,
            borrowed_books: None,
        }
    }

    #[test]
    fn test_update_effects() {
        let cache = QueryCache::new();
        let minute = Duration::from_secs(60);
        cache.set(&members::detail_with_borrowed_books(9), json!({}), minute);
        cache.set(&members::by_email("ada@example.org"), json!({}), minute);

        cache.apply(&update_effects(9, &member(9)));

        assert!(!cache.is_stale(&members::detail(9)));
        assert!(cache.is_stale(&members::detail_with_borrowed_books(9)));
        assert!(cache.is_stale(&members::by_email("ada@example.org")));
    }

    #[test]
    fn test_delete_drops_member_records() {
        let cache = QueryCache::new();
        let minute = Duration::from_secs(60);
        cache.set(&members::detail(9), json!({}), minute);
        cache.set(&borrowed_books::member_current(9), json!([]), minute);
        cache.set(&borrowed_books::member_current(90), json!([]), minute);

        cache.apply(&delete_effects(9));

        assert!(!cache.contains(&members::detail(9)));
        assert!(!cache.contains(&borrowed_books::member_current(9)));
        assert!(cache.contains(&borrowed_books::member_current(90)));
    }

    #[test]
    fn test_create_effects() {
        let commands = create_effects(&member(4));
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0].key(), &members::detail(4));
    }
}
