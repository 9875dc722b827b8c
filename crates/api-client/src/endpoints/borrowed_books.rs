//! Borrowed-books API endpoints
//!
//! Maps to `/borrowed-books`:
//! - Borrow, return and extend
//! - CRUD on single records, paginated listing
//! - Advanced (POST) and quick (GET) search
//! - Per-member views, due/overdue lists, status and date-range lookups
//! - Overdue maintenance and statistics

use super::segment;
use crate::client::LibraryClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    BorrowRequest, BorrowStatus, BorrowedBook, BorrowedBookSearch, BorrowedBookUpdateRequest,
    BorrowingStats,
};
use chrono::NaiveDate;
use serde_json::Value;

const BASE: &str = "borrowed-books";

/// Default page size of the full listing
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Borrowed-books API interface
#[derive(Clone)]
pub struct BorrowedBooksApi {
    client: LibraryClient,
}

impl BorrowedBooksApi {
    /// Create a new borrowed-books API interface
    pub(crate) fn new(client: LibraryClient) -> Self {
        Self { client }
    }

    /// Lend a book to a member
    ///
    /// POST /borrowed-books/borrow
    pub async fn borrow(&self, request: &BorrowRequest) -> ApiResult<BorrowedBook> {
        request.validate()?;
        let path = format!("{BASE}/borrow");
        self.client.post(&path, request).await?.into_data(&path)
    }

    /// Mark a record returned
    ///
    /// PUT /borrowed-books/{id}/return
    pub async fn return_book(&self, id: i64) -> ApiResult<BorrowedBook> {
        let path = format!("{BASE}/{id}/return");
        self.client
            .put_empty(&path, Option::<&[(&str, u32)]>::None)
            .await?
            .into_data(&path)
    }

    /// Push the due date back by `days`
    ///
    /// PUT /borrowed-books/{id}/extend?days=
    pub async fn extend_due_date(&self, id: i64, days: u32) -> ApiResult<BorrowedBook> {
        if days == 0 {
            return Err(ApiError::validation("days", "must be positive"));
        }
        let path = format!("{BASE}/{id}/extend");
        self.client
            .put_empty(&path, Some(&[("days", days)]))
            .await?
            .into_data(&path)
    }

    /// One page of all records
    ///
    /// GET /borrowed-books?page=&size=
    pub async fn get_all(&self, page: u32, size: u32) -> ApiResult<Vec<BorrowedBook>> {
        self.client
            .get_with_query(BASE, &[("page", page), ("size", size)])
            .await?
            .into_data(BASE)
    }

    /// Get a single record
    ///
    /// GET /borrowed-books/{id}
    pub async fn get(&self, id: i64) -> ApiResult<BorrowedBook> {
        let path = format!("{BASE}/{id}");
        self.client.get(&path).await?.into_data(&path)
    }

    /// Replace a record's fields
    ///
    /// PUT /borrowed-books/{id}
    pub async fn update(
        &self,
        id: i64,
        update: &BorrowedBookUpdateRequest,
    ) -> ApiResult<BorrowedBook> {
        update.validate()?;
        let path = format!("{BASE}/{id}");
        self.client.put(&path, update).await?.into_data(&path)
    }

    /// Delete a record
    ///
    /// DELETE /borrowed-books/{id}
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let path = format!("{BASE}/{id}");
        self.client.delete::<Value>(&path).await?.into_unit()
    }

    /// Advanced search
    ///
    /// POST /borrowed-books/search
    pub async fn search(&self, search: &BorrowedBookSearch) -> ApiResult<Vec<BorrowedBook>> {
        let path = format!("{BASE}/search");
        self.client.post(&path, search).await?.into_data(&path)
    }

    /// Free-text search
    ///
    /// GET /borrowed-books/search?q=
    pub async fn quick_search(&self, query: &str) -> ApiResult<Vec<BorrowedBook>> {
        let path = format!("{BASE}/search");
        self.client
            .get_with_query(&path, &[("q", query)])
            .await?
            .into_data(&path)
    }

    /// Every record of a member
    ///
    /// GET /borrowed-books/member/{id}
    pub async fn by_member(&self, member_id: i64) -> ApiResult<Vec<BorrowedBook>> {
        let path = format!("{BASE}/member/{member_id}");
        self.client.get(&path).await?.into_data(&path)
    }

    /// Books a member currently has out
    ///
    /// GET /borrowed-books/member/{id}/current
    pub async fn current_by_member(&self, member_id: i64) -> ApiResult<Vec<BorrowedBook>> {
        let path = format!("{BASE}/member/{member_id}/current");
        self.client.get(&path).await?.into_data(&path)
    }

    /// Outstanding fines of a member
    ///
    /// GET /borrowed-books/member/{id}/fines
    pub async fn member_fines(&self, member_id: i64) -> ApiResult<f64> {
        let path = format!("{BASE}/member/{member_id}/fines");
        self.client.get(&path).await?.into_data(&path)
    }

    /// Records past their due date
    ///
    /// GET /borrowed-books/overdue
    pub async fn overdue(&self) -> ApiResult<Vec<BorrowedBook>> {
        let path = format!("{BASE}/overdue");
        self.client.get(&path).await?.into_data(&path)
    }

    /// Records due today
    ///
    /// GET /borrowed-books/due-today
    pub async fn due_today(&self) -> ApiResult<Vec<BorrowedBook>> {
        let path = format!("{BASE}/due-today");
        self.client.get(&path).await?.into_data(&path)
    }

    /// Records due within `days`
    ///
    /// GET /borrowed-books/due-within?days=
    pub async fn due_within(&self, days: u32) -> ApiResult<Vec<BorrowedBook>> {
        let path = format!("{BASE}/due-within");
        self.client
            .get_with_query(&path, &[("days", days)])
            .await?
            .into_data(&path)
    }

    /// Records in one status
    ///
    /// GET /borrowed-books/status/{status}
    pub async fn by_status(&self, status: BorrowStatus) -> ApiResult<Vec<BorrowedBook>> {
        let path = format!("{BASE}/status/{}", segment(status.as_str()));
        self.client.get(&path).await?.into_data(&path)
    }

    /// Records borrowed between two dates
    ///
    /// GET /borrowed-books/date-range?start=&end=
    pub async fn by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApiResult<Vec<BorrowedBook>> {
        if end < start {
            return Err(ApiError::validation("end", "is before start"));
        }
        let path = format!("{BASE}/date-range");
        let query = [("start", start.to_string()), ("end", end.to_string())];
        self.client
            .get_with_query(&path, &query)
            .await?
            .into_data(&path)
    }

    /// Flag every open record past its due date as overdue
    ///
    /// PUT /borrowed-books/maintenance/update-overdue
    pub async fn update_overdue(&self) -> ApiResult<()> {
        let path = format!("{BASE}/maintenance/update-overdue");
        self.client
            .put_empty::<Value, [(&str, u32)]>(&path, None)
            .await?
            .into_unit()
    }

    /// Aggregate numbers
    ///
    /// GET /borrowed-books/stats
    pub async fn statistics(&self) -> ApiResult<BorrowingStats> {
        let path = format!("{BASE}/stats");
        self.client.get(&path).await?.into_data(&path)
    }
}
