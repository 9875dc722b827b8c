//! Borrowing queries and mutations
//!
//! Every borrowing write changes more than its own record: the book's
//! available copies, the member's open loans and the aggregate statistics all
//! move with it. The effects below refresh each of those families.

use crate::endpoints::DEFAULT_PAGE_SIZE;
use crate::error::ApiResult;
use crate::keys::{books, borrowed_books, members};
use crate::models::{
    BorrowRequest, BorrowStatus, BorrowedBook, BorrowedBookFilters, BorrowedBookSearch,
    BorrowedBookUpdateRequest, BorrowingStats,
};
use crate::query::{QueryClient, QueryOptions, QueryState};
use chrono::NaiveDate;
use libris_core::cache::{CacheCommand, CacheTime};

/// Borrowing reads and writes
#[derive(Clone)]
pub struct BorrowedBookQueries {
    client: QueryClient,
}

impl BorrowedBookQueries {
    pub(crate) fn new(client: QueryClient) -> Self {
        Self { client }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// First page at the default size
    pub async fn all(&self) -> QueryState<Vec<BorrowedBook>> {
        self.list(0, DEFAULT_PAGE_SIZE).await
    }

    /// One page of the full listing
    pub async fn list(&self, page: u32, size: u32) -> QueryState<Vec<BorrowedBook>> {
        let key = borrowed_books::list(&BorrowedBookFilters::page(page, size));
        let api = self.client.api().borrowed_books();
        self.client
            .fetch(key, QueryOptions::new(CacheTime::MEDIUM), move || {
                let api = api.clone();
                async move { api.get_all(page, size).await }
            })
            .await
    }

    /// One record; disabled without a positive id
    pub async fn detail(&self, id: Option<i64>) -> QueryState<BorrowedBook> {
        let id = id.unwrap_or_default();
        let options = QueryOptions::new(CacheTime::MEDIUM).enabled(id > 0);
        let api = self.client.api().borrowed_books();
        self.client
            .fetch(borrowed_books::detail(id), options, move || {
                let api = api.clone();
                async move { api.get(id).await }
            })
            .await
    }

    /// Advanced search; disabled until criteria are given
    pub async fn search(&self, search: Option<&BorrowedBookSearch>) -> QueryState<Vec<BorrowedBook>> {
        let options = QueryOptions::new(CacheTime::SHORT).enabled(search.is_some());
        let search = search.cloned().unwrap_or_default();
        let api = self.client.api().borrowed_books();
        self.client
            .fetch(borrowed_books::search(&search), options, move || {
                let api = api.clone();
                let search = search.clone();
                async move { api.search(&search).await }
            })
            .await
    }

    /// Free-text search; disabled for a blank query
    pub async fn quick_search(&self, query: &str) -> QueryState<Vec<BorrowedBook>> {
        let query = query.trim().to_string();
        let options = QueryOptions::new(CacheTime::SHORT).enabled(!query.is_empty());
        let api = self.client.api().borrowed_books();
        self.client
            .fetch(borrowed_books::quick_search(&query), options, move || {
                let api = api.clone();
                let query = query.clone();
                async move { api.quick_search(&query).await }
            })
            .await
    }

    /// Every record of a member
    pub async fn by_member(&self, member_id: i64) -> QueryState<Vec<BorrowedBook>> {
        let options = QueryOptions::new(CacheTime::MEDIUM).enabled(member_id > 0);
        let api = self.client.api().borrowed_books();
        self.client
            .fetch(borrowed_books::member(member_id), options, move || {
                let api = api.clone();
                async move { api.by_member(member_id).await }
            })
            .await
    }

    /// Books a member currently has out
    pub async fn current_by_member(&self, member_id: i64) -> QueryState<Vec<BorrowedBook>> {
        let options = QueryOptions::new(CacheTime::SHORT).enabled(member_id > 0);
        let api = self.client.api().borrowed_books();
        self.client
            .fetch(borrowed_books::member_current(member_id), options, move || {
                let api = api.clone();
                async move { api.current_by_member(member_id).await }
            })
            .await
    }

    /// Outstanding fines of a member
    pub async fn member_fines(&self, member_id: i64) -> QueryState<f64> {
        let options = QueryOptions::new(CacheTime::MEDIUM).enabled(member_id > 0);
        let api = self.client.api().borrowed_books();
        self.client
            .fetch(borrowed_books::member_fines(member_id), options, move || {
                let api = api.clone();
                async move { api.member_fines(member_id).await }
            })
            .await
    }

    /// Overdue records
    pub async fn overdue(&self) -> QueryState<Vec<BorrowedBook>> {
        let api = self.client.api().borrowed_books();
        self.client
            .fetch(borrowed_books::overdue(), QueryOptions::new(CacheTime::SHORT), move || {
                let api = api.clone();
                async move { api.overdue().await }
            })
            .await
    }

    /// Records due today
    pub async fn due_today(&self) -> QueryState<Vec<BorrowedBook>> {
        let api = self.client.api().borrowed_books();
        self.client
            .fetch(borrowed_books::due_today(), QueryOptions::new(CacheTime::MEDIUM), move || {
                let api = api.clone();
                async move { api.due_today().await }
            })
            .await
    }

    /// Records due within `days`; disabled for zero
    pub async fn due_within(&self, days: u32) -> QueryState<Vec<BorrowedBook>> {
        let options = QueryOptions::new(CacheTime::MEDIUM).enabled(days > 0);
        let api = self.client.api().borrowed_books();
        self.client
            .fetch(borrowed_books::due_within(days), options, move || {
                let api = api.clone();
                async move { api.due_within(days).await }
            })
            .await
    }

    /// Records in one status; disabled without a status
    pub async fn by_status(&self, status: Option<BorrowStatus>) -> QueryState<Vec<BorrowedBook>> {
        let Some(status) = status else {
            return QueryState::NotRequested;
        };
        let api = self.client.api().borrowed_books();
        self.client
            .fetch(borrowed_books::status(status), QueryOptions::new(CacheTime::MEDIUM), move || {
                let api = api.clone();
                async move { api.by_status(status).await }
            })
            .await
    }

    /// Records borrowed in a date range; disabled until both ends are given
    pub async fn by_date_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> QueryState<Vec<BorrowedBook>> {
        let (Some(start), Some(end)) = (start, end) else {
            return QueryState::NotRequested;
        };
        let api = self.client.api().borrowed_books();
        self.client
            .fetch(
                borrowed_books::date_range(start, end),
                QueryOptions::new(CacheTime::LONG),
                move || {
                    let api = api.clone();
                    async move { api.by_date_range(start, end).await }
                },
            )
            .await
    }

    /// Aggregate numbers
    pub async fn statistics(&self) -> QueryState<BorrowingStats> {
        let api = self.client.api().borrowed_books();
        self.client
            .fetch(borrowed_books::stats(), QueryOptions::new(CacheTime::MEDIUM), move || {
                let api = api.clone();
                async move { api.statistics().await }
            })
            .await
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Lend a book
    pub async fn borrow(&self, request: &BorrowRequest) -> ApiResult<BorrowedBook> {
        let api = self.client.api().borrowed_books();
        self.client
            .mutate_once("borrow book", || api.borrow(request), record_effects)
            .await
    }

    /// Return a book
    pub async fn return_book(&self, id: i64) -> ApiResult<BorrowedBook> {
        let api = self.client.api().borrowed_books();
        self.client
            .mutate("return book", || api.return_book(id), record_effects)
            .await
    }

    /// Push a due date back by `days`
    pub async fn extend_due_date(&self, id: i64, days: u32) -> ApiResult<BorrowedBook> {
        let api = self.client.api().borrowed_books();
        self.client
            .mutate("extend due date", || api.extend_due_date(id, days), record_effects)
            .await
    }

    /// Replace a record's fields
    pub async fn update(&self, id: i64, request: &BorrowedBookUpdateRequest) -> ApiResult<BorrowedBook> {
        let api = self.client.api().borrowed_books();
        self.client
            .mutate("update borrowing record", || api.update(id, request), record_effects)
            .await
    }

    /// Delete a record
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let api = self.client.api().borrowed_books();
        self.client
            .mutate("delete borrowing record", || api.delete(id), |_| delete_effects(id))
            .await
    }

    /// Flag every open record past its due date as overdue
    pub async fn update_overdue(&self) -> ApiResult<()> {
        let api = self.client.api().borrowed_books();
        self.client
            .mutate("update overdue records", || api.update_overdue(), |_| overdue_sweep_effects())
            .await
    }
}

/// Collections every borrowing write can change
fn derived() -> [CacheCommand; 7] {
    [
        CacheCommand::Invalidate(borrowed_books::lists()),
        CacheCommand::Invalidate(borrowed_books::searches()),
        CacheCommand::Invalidate(borrowed_books::stats()),
        CacheCommand::Invalidate(borrowed_books::overdue()),
        CacheCommand::Invalidate(borrowed_books::due_today()),
        CacheCommand::Invalidate(borrowed_books::due_within_lists()),
        CacheCommand::Invalidate(borrowed_books::status_lists()),
    ]
}

/// Cache effects of a write that returns the changed record
///
/// Covers borrow, return, extension and update. The record replaces its detail
/// entry; the member's views and every book key are refreshed because available
/// copies change with each loan.
#[must_use]
pub fn record_effects(record: &BorrowedBook) -> Vec<CacheCommand> {
    let mut commands = vec![CacheCommand::replace(borrowed_books::detail(record.id), record)];
    commands.extend(derived());
    commands.push(CacheCommand::Invalidate(borrowed_books::date_ranges()));
    commands.push(CacheCommand::Invalidate(borrowed_books::member(record.member_id)));
    commands.push(CacheCommand::Invalidate(members::detail_with_borrowed_books(
        record.member_id,
    )));
    commands.push(CacheCommand::Invalidate(books::all()));
    commands
}

/// Cache effects of a successful delete
///
/// The deleted record's member is unknown here, so every member view is refreshed.
#[must_use]
pub fn delete_effects(id: i64) -> Vec<CacheCommand> {
    let mut commands = vec![CacheCommand::Remove(borrowed_books::detail(id))];
    commands.extend(derived());
    commands.push(CacheCommand::Invalidate(borrowed_books::date_ranges()));
    commands.push(CacheCommand::Invalidate(borrowed_books::member_lists()));
    commands.push(CacheCommand::Invalidate(books::all()));
    commands
}

/// Cache effects of the overdue sweep
#[must_use]
pub fn overdue_sweep_effects() -> Vec<CacheCommand> {
    let mut commands = derived().to_vec();
    commands.push(CacheCommand::Invalidate(borrowed_books::details()));
    commands.push(CacheCommand::Invalidate(borrowed_books::member_lists()));
    commands
}
