//! Books API endpoints
//!
//! Maps to `/books`:
//! - CRUD on single books, optionally paginated listing
//! - Search (POST body), available books, books per category
//! - Category names and lightweight summaries

use super::segment;
use crate::client::LibraryClient;
use crate::error::ApiResult;
use crate::models::{Book, BookCreateRequest, BookFilters, BookSearch, BookSummary};
use serde_json::Value;

const BASE: &str = "books";

/// Books API interface
#[derive(Clone)]
pub struct BooksApi {
    client: LibraryClient,
}

impl BooksApi {
    /// Create a new books API interface
    pub(crate) fn new(client: LibraryClient) -> Self {
        Self { client }
    }

    /// Create a book
    ///
    /// POST /books
    pub async fn create(&self, book: &BookCreateRequest) -> ApiResult<Book> {
        book.validate()?;
        self.client.post(BASE, book).await?.into_data(BASE)
    }

    /// List books; set `page`/`size` in `filters` to paginate
    ///
    /// GET /books
    pub async fn get_all(&self, filters: &BookFilters) -> ApiResult<Vec<Book>> {
        if filters.is_empty() {
            self.client.get(BASE).await?.into_data(BASE)
        } else {
            self.client
                .get_with_query(BASE, filters)
                .await?
                .into_data(BASE)
        }
    }

    /// Get a single book
    ///
    /// GET /books/{id}
    pub async fn get(&self, id: i64) -> ApiResult<Book> {
        let path = format!("{BASE}/{id}");
        self.client.get(&path).await?.into_data(&path)
    }

    /// Replace a book's fields
    ///
    /// PUT /books/{id}
    pub async fn update(&self, id: i64, book: &BookCreateRequest) -> ApiResult<Book> {
        book.validate()?;
        let path = format!("{BASE}/{id}");
        self.client.put(&path, book).await?.into_data(&path)
    }

    /// Delete a book
    ///
    /// DELETE /books/{id}
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let path = format!("{BASE}/{id}");
        self.client.delete::<Value>(&path).await?.into_unit()
    }

    /// Search books
    ///
    /// POST /books/search
    pub async fn search(&self, search: &BookSearch) -> ApiResult<Vec<Book>> {
        let path = format!("{BASE}/search");
        self.client.post(&path, search).await?.into_data(&path)
    }

    /// Books with at least one copy on the shelf
    ///
    /// GET /books/available
    pub async fn available(&self) -> ApiResult<Vec<Book>> {
        let path = format!("{BASE}/available");
        self.client.get(&path).await?.into_data(&path)
    }

    /// Books in one category
    ///
    /// GET /books/category/{category}
    pub async fn by_category(&self, category: &str) -> ApiResult<Vec<Book>> {
        let path = format!("{BASE}/category/{}", segment(category));
        self.client.get(&path).await?.into_data(&path)
    }

    /// Distinct category names
    ///
    /// GET /books/categories
    pub async fn categories(&self) -> ApiResult<Vec<String>> {
        let path = format!("{BASE}/categories");
        self.client.get(&path).await?.into_data(&path)
    }

    /// Book summaries, optionally filtered
    ///
    /// GET /books/summaries
    pub async fn summaries(&self, filters: &BookFilters) -> ApiResult<Vec<BookSummary>> {
        let path = format!("{BASE}/summaries");
        self.client
            .get_with_query(&path, filters)
            .await?
            .into_data(&path)
    }
}
