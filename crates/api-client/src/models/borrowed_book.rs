//! Borrowing records

use crate::error::{ApiError, ApiResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a borrowing record
///
/// `Borrowed` moves to `Returned`, `Overdue` or `Lost`; `Overdue` moves to
/// `Returned` or `Lost`. `Returned` and `Lost` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BorrowStatus {
    Borrowed,
    Returned,
    Overdue,
    Lost,
}

impl BorrowStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [Self; 4] = [Self::Borrowed, Self::Returned, Self::Overdue, Self::Lost];

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Borrowed => "BORROWED",
            Self::Returned => "RETURNED",
            Self::Overdue => "OVERDUE",
            Self::Lost => "LOST",
        }
    }

    /// Whether the record may move from `self` to `next`
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Borrowed, Self::Returned | Self::Overdue | Self::Lost)
                | (Self::Overdue, Self::Returned | Self::Lost)
        ) || self == next
    }

    /// Whether the book is still out
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Borrowed | Self::Overdue)
    }
}

impl fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| ApiError::validation("status", format!("unknown status {s}")))
    }
}

/// Borrowing record as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedBook {
    pub id: i64,
    pub book_id: i64,
    pub member_id: i64,
    pub book_title: Option<String>,
    pub author_name: Option<String>,
    pub member_name: Option<String>,
    pub member_email: Option<String>,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: BorrowStatus,
    #[serde(default)]
    pub fine_amount: f64,
    pub notes: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl BorrowedBook {
    /// Whether the book is still out past its due date on `today`
    #[must_use]
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        self.status.is_open() && self.due_date < today
    }

    /// Days left until the due date; negative once overdue
    #[must_use]
    pub fn days_until_due(&self, today: NaiveDate) -> i64 {
        (self.due_date - today).num_days()
    }
}

/// Payload for the borrow endpoint
///
/// The server defaults `borrowDate` to today and `dueDate` to fourteen days later.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub book_id: i64,
    pub member_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrow_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl BorrowRequest {
    /// Borrow `book_id` for `member_id` with server-side default dates
    #[must_use]
    pub fn new(book_id: i64, member_id: i64) -> Self {
        Self {
            book_id,
            member_id,
            ..Self::default()
        }
    }

    /// Set explicit borrow and due dates
    #[must_use]
    pub fn with_dates(mut self, borrow_date: NaiveDate, due_date: NaiveDate) -> Self {
        self.borrow_date = Some(borrow_date);
        self.due_date = Some(due_date);
        self
    }

    /// Attach a note
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Check the payload before sending it
    pub fn validate(&self) -> ApiResult<()> {
        if self.book_id <= 0 {
            return Err(ApiError::validation("bookId", "must reference a book"));
        }
        if self.member_id <= 0 {
            return Err(ApiError::validation("memberId", "must reference a member"));
        }
        check_due_date(self.borrow_date, self.due_date)
    }
}

/// Payload for updating a borrowing record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedBookUpdateRequest {
    pub book_id: i64,
    pub member_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrow_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BorrowStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fine_amount: Option<f64>,
}

impl BorrowedBookUpdateRequest {
    /// Start an update from the current record
    #[must_use]
    pub fn from_record(record: &BorrowedBook) -> Self {
        Self {
            book_id: record.book_id,
            member_id: record.member_id,
            borrow_date: Some(record.borrow_date),
            due_date: Some(record.due_date),
            notes: record.notes.clone(),
            status: Some(record.status),
            return_date: record.return_date,
            fine_amount: Some(record.fine_amount),
        }
    }

    /// Check the payload before sending it
    pub fn validate(&self) -> ApiResult<()> {
        if self.book_id <= 0 {
            return Err(ApiError::validation("bookId", "must reference a book"));
        }
        if self.member_id <= 0 {
            return Err(ApiError::validation("memberId", "must reference a member"));
        }
        check_due_date(self.borrow_date, self.due_date)?;

        if let (Some(borrowed), Some(returned)) = (self.borrow_date, self.return_date) {
            if returned < borrowed {
                return Err(ApiError::validation("returnDate", "is before borrowDate"));
            }
        }
        if let Some(fine) = self.fine_amount {
            if !fine.is_finite() || fine < 0.0 {
                return Err(ApiError::validation("fineAmount", "must be zero or more"));
            }
        }
        Ok(())
    }
}

fn check_due_date(borrow_date: Option<NaiveDate>, due_date: Option<NaiveDate>) -> ApiResult<()> {
    match (borrow_date, due_date) {
        (Some(borrowed), Some(due)) if due < borrowed => {
            Err(ApiError::validation("dueDate", "is before borrowDate"))
        }
        _ => Ok(()),
    }
}

/// Filters embedded in borrowed-book list keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedBookFilters {
    pub member_id: Option<i64>,
    pub book_id: Option<i64>,
    pub status: Option<BorrowStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl BorrowedBookFilters {
    /// Filters for one page of the full list
    #[must_use]
    pub fn page(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
            ..Self::default()
        }
    }
}

/// Sort direction for advanced search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Body of the advanced borrowed-book search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedBookSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BorrowStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrow_date_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrow_date_to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date_to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_date_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_date_to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_fine_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fine_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_fines: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<SortDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overdue: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_within_days: Option<u32>,
}

impl BorrowedBookSearch {
    /// Whether no criterion is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Aggregate borrowing numbers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingStats {
    pub total_borrowings: u64,
    pub currently_borrowed: u64,
    pub overdue_books: u64,
    pub returned_books: u64,
    pub total_fines_collected: f64,
}
