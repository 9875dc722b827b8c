//! Borrowing record filters and sorts

use super::{contains_ci, needle, unknown};
use crate::error::ApiError;
use crate::models::{BorrowStatus, BorrowedBook};
use libris_core::listing::{paginate, Page};
use std::cmp::Ordering;
use std::str::FromStr;

/// Borrowing record filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BorrowedBookFilter {
    /// Substring of book title, author name, member name or status
    pub search: Option<String>,
    /// Exact status
    pub status: Option<BorrowStatus>,
}

impl BorrowedBookFilter {
    /// Records passing the filter, in their original order
    #[must_use]
    pub fn apply(&self, records: &[BorrowedBook]) -> Vec<BorrowedBook> {
        let search = needle(self.search.as_deref());
        records
            .iter()
            .filter(|r| self.status.map_or(true, |s| r.status == s))
            .filter(|r| search.as_deref().map_or(true, |n| matches_search(r, n)))
            .cloned()
            .collect()
    }
}

fn matches_search(record: &BorrowedBook, needle: &str) -> bool {
    [&record.book_title, &record.author_name, &record.member_name]
        .into_iter()
        .flatten()
        .any(|field| contains_ci(field, needle))
        || contains_ci(record.status.as_str(), needle)
}

/// Borrowing record orderings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BorrowedBookSort {
    /// Most recently borrowed first
    #[default]
    Latest,
    /// Earliest due date first
    DueDate,
    /// Member name A to Z
    MemberName,
    /// Book title A to Z
    BookTitle,
    /// Grouped by status
    Status,
}

impl BorrowedBookSort {
    fn compare(self, a: &BorrowedBook, b: &BorrowedBook) -> Ordering {
        match self {
            Self::Latest => b.borrow_date.cmp(&a.borrow_date),
            Self::DueDate => a.due_date.cmp(&b.due_date),
            Self::MemberName => by_text(a.member_name.as_deref(), b.member_name.as_deref()),
            Self::BookTitle => by_text(a.book_title.as_deref(), b.book_title.as_deref()),
            Self::Status => a.status.as_str().cmp(b.status.as_str()),
        }
    }

    /// Stable in-place sort
    pub fn sort(self, records: &mut [BorrowedBook]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}

/// Case-insensitive, missing values last
fn by_text(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl FromStr for BorrowedBookSort {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "latest" => Ok(Self::Latest),
            "due-date" | "duedate" => Ok(Self::DueDate),
            "member" | "member-name" => Ok(Self::MemberName),
            "title" | "book-title" => Ok(Self::BookTitle),
            "status" => Ok(Self::Status),
            other => Err(unknown("sort", other)),
        }
    }
}

/// Filter, sort and slice one page of records
#[must_use]
pub fn page(
    records: &[BorrowedBook],
    filter: &BorrowedBookFilter,
    sort: BorrowedBookSort,
    page: usize,
    per_page: usize,
) -> Page<BorrowedBook> {
    let mut items = filter.apply(records);
    sort.sort(&mut items);
    paginate(items, page, per_page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: i64, title: &str, member: &str, day: u32, status: BorrowStatus) -> BorrowedBook {
        let borrowed = NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        BorrowedBook {
            id,
            book_id: id * 10,
            member_id: 1,
            book_title: Some(title.into()),
            author_name: None,
            member_name: Some(member.into()),
            member_email: None,
            borrow_date: borrowed,
            due_date: borrowed + chrono::Duration::days(14 + i64::from(day)),
            return_date: None,
            status,
            fine_amount: 0.0,
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn records() -> Vec<BorrowedBook> {
        vec![
            record(1, "Dune", "Grace", 1, BorrowStatus::Returned),
            record(2, "Kindred", "ada", 3, BorrowStatus::Borrowed),
            record(3, "Emma", "Linus", 2, BorrowStatus::Overdue),
        ]
    }

    fn ids(records: &[BorrowedBook]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_search_matches_status_and_names() {
        let filter = BorrowedBookFilter {
            search: Some("overdue".into()),
            ..BorrowedBookFilter::default()
        };
        assert_eq!(ids(&filter.apply(&records())), vec![3]);

        let filter = BorrowedBookFilter {
            search: Some("ADA".into()),
            ..BorrowedBookFilter::default()
        };
        assert_eq!(ids(&filter.apply(&records())), vec![2]);
    }

    #[test]
    fn test_sorts() {
        let mut items = records();
        BorrowedBookSort::Latest.sort(&mut items);
        assert_eq!(ids(&items), vec![2, 3, 1]);

        BorrowedBookSort::MemberName.sort(&mut items);
        assert_eq!(ids(&items), vec![2, 1, 3]);

        BorrowedBookSort::DueDate.sort(&mut items);
        assert_eq!(ids(&items), vec![1, 3, 2]);
    }

    #[test]
    fn test_status_filter_and_page() {
        let filter = BorrowedBookFilter {
            status: Some(BorrowStatus::Borrowed),
            ..BorrowedBookFilter::default()
        };
        let result = page(&records(), &filter, BorrowedBookSort::Latest, 0, 10);
        assert_eq!(ids(&result.items), vec![2]);
        assert_eq!(result.total_pages, 1);
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!("dueDate".parse::<BorrowedBookSort>().unwrap(), BorrowedBookSort::DueDate);
        assert_eq!("due-date".parse::<BorrowedBookSort>().unwrap(), BorrowedBookSort::DueDate);
        assert!("oldest".parse::<BorrowedBookSort>().is_err());
    }
}
