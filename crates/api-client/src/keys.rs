//! Cache keys for every cached read
//!
//! One namespace per resource. Every key of a resource starts with its `all()`
//! key; list keys live under `lists()` and detail keys under `details()`, so a
//! mutation can invalidate a whole family with one prefix:
//!
//! ```text
//! books
//! books/list/{genre="Fiction"}
//! books/detail/7
//! borrowed-books/member/3/current
//! ```

use libris_core::key::QueryKey;

macro_rules! resource_keys {
    ($root:literal) => {
        /// Root of every key of this resource
        #[must_use]
        pub fn all() -> QueryKey {
            QueryKey::root($root)
        }

        /// Parent of every list key
        #[must_use]
        pub fn lists() -> QueryKey {
            all().push("list")
        }

        /// Parent of every detail key
        #[must_use]
        pub fn details() -> QueryKey {
            all().push("detail")
        }

        /// A single entity
        #[must_use]
        pub fn detail(id: i64) -> QueryKey {
            details().push(id)
        }

        /// Parent of every search result key
        #[must_use]
        pub fn searches() -> QueryKey {
            all().push("search")
        }
    };
}

/// Author keys
pub mod authors {
    use super::QueryKey;
    use crate::models::AuthorFilters;

    resource_keys!("authors");

    /// A filtered author list
    #[must_use]
    pub fn list(filters: &AuthorFilters) -> QueryKey {
        lists().push_params(filters)
    }

    /// An author with their books
    #[must_use]
    pub fn detail_with_books(id: i64) -> QueryKey {
        detail(id).push("books")
    }

    /// Name search results
    #[must_use]
    pub fn search(name: &str) -> QueryKey {
        searches().push(name)
    }

    /// Parent of every nationality key
    #[must_use]
    pub fn nationalities() -> QueryKey {
        all().push("nationality")
    }

    /// Authors of one nationality
    #[must_use]
    pub fn by_nationality(nationality: &str) -> QueryKey {
        nationalities().push(nationality)
    }
}

/// Book keys
pub mod books {
    use super::QueryKey;
    use crate::models::{BookFilters, BookSearch};

    resource_keys!("books");

    /// A filtered or paginated book list
    #[must_use]
    pub fn list(filters: &BookFilters) -> QueryKey {
        lists().push_params(filters)
    }

    /// Search results for one request body
    #[must_use]
    pub fn search(search: &BookSearch) -> QueryKey {
        searches().push_params(search)
    }

    /// Books with copies on the shelf
    #[must_use]
    pub fn available() -> QueryKey {
        all().push("available")
    }

    /// Parent of every per-category key
    #[must_use]
    pub fn category_lists() -> QueryKey {
        all().push("category")
    }

    /// Books in one category
    #[must_use]
    pub fn by_category(category: &str) -> QueryKey {
        category_lists().push(category)
    }

    /// Category names
    #[must_use]
    pub fn categories() -> QueryKey {
        all().push("categories")
    }

    /// Parent of every summaries key
    #[must_use]
    pub fn summary_lists() -> QueryKey {
        all().push("summaries")
    }

    /// Summaries for one filter set
    #[must_use]
    pub fn summaries(filters: &BookFilters) -> QueryKey {
        summary_lists().push_params(filters)
    }
}

/// Member keys
pub mod members {
    use super::QueryKey;
    use crate::models::MemberFilters;

    resource_keys!("members");

    /// A filtered member list
    #[must_use]
    pub fn list(filters: &MemberFilters) -> QueryKey {
        lists().push_params(filters)
    }

    /// A member with their borrowing records
    #[must_use]
    pub fn detail_with_borrowed_books(id: i64) -> QueryKey {
        detail(id).push("borrowed-books")
    }

    /// Search results for one term
    #[must_use]
    pub fn search(term: &str) -> QueryKey {
        searches().push(term)
    }

    /// Parent of every e-mail lookup key
    #[must_use]
    pub fn emails() -> QueryKey {
        all().push("email")
    }

    /// Lookup by e-mail
    #[must_use]
    pub fn by_email(email: &str) -> QueryKey {
        emails().push(email)
    }
}

/// Borrowed-book keys
pub mod borrowed_books {
    use super::QueryKey;
    use crate::models::{BorrowStatus, BorrowedBookFilters, BorrowedBookSearch};
    use chrono::NaiveDate;
    use serde::Serialize;

    resource_keys!("borrowed-books");

    /// A filtered or paginated list
    #[must_use]
    pub fn list(filters: &BorrowedBookFilters) -> QueryKey {
        lists().push_params(filters)
    }

    /// Advanced search results for one request body
    #[must_use]
    pub fn search(search: &BorrowedBookSearch) -> QueryKey {
        searches().push_params(search)
    }

    /// Quick search results for one query string
    #[must_use]
    pub fn quick_search(query: &str) -> QueryKey {
        searches().push_params(query)
    }

    /// Parent of every per-member key
    #[must_use]
    pub fn member_lists() -> QueryKey {
        all().push("member")
    }

    /// Every record of a member
    #[must_use]
    pub fn member(member_id: i64) -> QueryKey {
        member_lists().push(member_id)
    }

    /// Books a member currently has out
    #[must_use]
    pub fn member_current(member_id: i64) -> QueryKey {
        member(member_id).push("current")
    }

    /// Outstanding fines of a member
    #[must_use]
    pub fn member_fines(member_id: i64) -> QueryKey {
        member(member_id).push("fines")
    }

    /// Overdue records
    #[must_use]
    pub fn overdue() -> QueryKey {
        all().push("overdue")
    }

    /// Records due today
    #[must_use]
    pub fn due_today() -> QueryKey {
        all().push("due-today")
    }

    /// Parent of every due-within key
    #[must_use]
    pub fn due_within_lists() -> QueryKey {
        all().push("due-within")
    }

    /// Records due within a number of days
    #[must_use]
    pub fn due_within(days: u32) -> QueryKey {
        due_within_lists().push(days)
    }

    /// Parent of every per-status key
    #[must_use]
    pub fn status_lists() -> QueryKey {
        all().push("status")
    }

    /// Records in one status
    #[must_use]
    pub fn status(status: BorrowStatus) -> QueryKey {
        status_lists().push(status.as_str())
    }

    /// Parent of every date-range key
    #[must_use]
    pub fn date_ranges() -> QueryKey {
        all().push("date-range")
    }

    /// Records borrowed in a date range
    #[must_use]
    pub fn date_range(start: NaiveDate, end: NaiveDate) -> QueryKey {
        #[derive(Serialize)]
        struct Range {
            start: NaiveDate,
            end: NaiveDate,
        }
        date_ranges().push_params(&Range { start, end })
    }

    /// Borrowing statistics
    #[must_use]
    pub fn stats() -> QueryKey {
        all().push("stats")
    }
}
