//! Members API endpoints
//!
//! Maps to `/members`:
//! - CRUD on single members
//! - A member together with their borrowing records
//! - Search by term and lookup by e-mail

use super::segment;
use crate::client::LibraryClient;
use crate::error::ApiResult;
use crate::models::{Member, MemberCreateRequest};
use serde_json::Value;

const BASE: &str = "members";

/// Members API interface
#[derive(Clone)]
pub struct MembersApi {
    client: LibraryClient,
}

impl MembersApi {
    /// Create a new members API interface
    pub(crate) fn new(client: LibraryClient) -> Self {
        Self { client }
    }

    /// Register a member
    ///
    /// POST /members
    pub async fn create(&self, member: &MemberCreateRequest) -> ApiResult<Member> {
        member.validate()?;
        self.client.post(BASE, member).await?.into_data(BASE)
    }

    /// List all members
    ///
    /// GET /members
    pub async fn get_all(&self) -> ApiResult<Vec<Member>> {
        self.client.get(BASE).await?.into_data(BASE)
    }

    /// Get a single member
    ///
    /// GET /members/{id}
    pub async fn get(&self, id: i64) -> ApiResult<Member> {
        let path = format!("{BASE}/{id}");
        self.client.get(&path).await?.into_data(&path)
    }

    /// Get a member with their borrowing records filled in
    ///
    /// GET /members/{id}/borrowed-books
    pub async fn get_with_borrowed_books(&self, id: i64) -> ApiResult<Member> {
        let path = format!("{BASE}/{id}/borrowed-books");
        self.client.get(&path).await?.into_data(&path)
    }

    /// Replace a member's fields
    ///
    /// PUT /members/{id}
    pub async fn update(&self, id: i64, member: &MemberCreateRequest) -> ApiResult<Member> {
        member.validate()?;
        let path = format!("{BASE}/{id}");
        self.client.put(&path, member).await?.into_data(&path)
    }

    /// Delete a member
    ///
    /// DELETE /members/{id}
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let path = format!("{BASE}/{id}");
        self.client.delete::<Value>(&path).await?.into_unit()
    }

    /// Search members by name or e-mail fragment
    ///
    /// GET /members/search?searchTerm=
    pub async fn search(&self, term: &str) -> ApiResult<Vec<Member>> {
        let path = format!("{BASE}/search");
        self.client
            .get_with_query(&path, &[("searchTerm", term)])
            .await?
            .into_data(&path)
    }

    /// Look a member up by e-mail
    ///
    /// GET /members/email/{email}
    pub async fn by_email(&self, email: &str) -> ApiResult<Member> {
        let path = format!("{BASE}/email/{}", segment(email));
        self.client.get(&path).await?.into_data(&path)
    }
}
