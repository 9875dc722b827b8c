//! Authors API endpoints
//!
//! Maps to `/authors`:
//! - CRUD on single authors
//! - An author together with their books
//! - Search by name and lookup by nationality

use super::segment;
use crate::client::LibraryClient;
use crate::error::ApiResult;
use crate::models::{Author, AuthorCreateRequest};
use serde_json::Value;

const BASE: &str = "authors";

/// Authors API interface
#[derive(Clone)]
pub struct AuthorsApi {
    client: LibraryClient,
}

impl AuthorsApi {
    /// Create a new authors API interface
    pub(crate) fn new(client: LibraryClient) -> Self {
        Self { client }
    }

    /// Create an author
    ///
    /// POST /authors
    pub async fn create(&self, author: &AuthorCreateRequest) -> ApiResult<Author> {
        author.validate()?;
        self.client.post(BASE, author).await?.into_data(BASE)
    }

    /// List all authors
    ///
    /// GET /authors
    pub async fn get_all(&self) -> ApiResult<Vec<Author>> {
        self.client.get(BASE).await?.into_data(BASE)
    }

    /// Get a single author
    ///
    /// GET /authors/{id}
    pub async fn get(&self, id: i64) -> ApiResult<Author> {
        let path = format!("{BASE}/{id}");
        self.client.get(&path).await?.into_data(&path)
    }

    /// Get an author with their books filled in
    ///
    /// GET /authors/{id}/books
    pub async fn get_with_books(&self, id: i64) -> ApiResult<Author> {
        let path = format!("{BASE}/{id}/books");
        self.client.get(&path).await?.into_data(&path)
    }

    /// Replace an author's fields
    ///
    /// PUT /authors/{id}
    pub async fn update(&self, id: i64, author: &AuthorCreateRequest) -> ApiResult<Author> {
        author.validate()?;
        let path = format!("{BASE}/{id}");
        self.client.put(&path, author).await?.into_data(&path)
    }

    /// Delete an author
    ///
    /// DELETE /authors/{id}
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let path = format!("{BASE}/{id}");
        self.client.delete::<Value>(&path).await?.into_unit()
    }

    /// Search authors by name
    ///
    /// GET /authors/search?name=
    pub async fn search_by_name(&self, name: &str) -> ApiResult<Vec<Author>> {
        let path = format!("{BASE}/search");
        self.client
            .get_with_query(&path, &[("name", name)])
            .await?
            .into_data(&path)
    }

    /// Authors of one nationality
    ///
    /// GET /authors/nationality/{nationality}
    pub async fn by_nationality(&self, nationality: &str) -> ApiResult<Vec<Author>> {
        let path = format!("{BASE}/nationality/{}", segment(nationality));
        self.client.get(&path).await?.into_data(&path)
    }
}
