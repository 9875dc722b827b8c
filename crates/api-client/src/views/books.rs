//! Book list filters and sorts

use super::{contains_ci, needle, unknown};
use crate::error::ApiError;
use crate::models::Book;
use libris_core::listing::{paginate, Page};
use std::cmp::Ordering;
use std::str::FromStr;

/// Copies-on-shelf filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// At least one copy available
    Available,
    /// Every copy out
    Unavailable,
}

impl FromStr for Availability {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" => Ok(Self::Available),
            "unavailable" => Ok(Self::Unavailable),
            other => Err(unknown("availability", other)),
        }
    }
}

/// Publication decade filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearBucket {
    /// 2020 and later
    Twenties,
    /// 2010 to 2019
    Tens,
    /// 2000 to 2009
    Noughties,
    /// Before 2000
    Before2000,
}

impl YearBucket {
    /// Whether `year` falls in this bucket
    #[must_use]
    pub fn contains(self, year: i32) -> bool {
        match self {
            Self::Twenties => year >= 2020,
            Self::Tens => (2010..2020).contains(&year),
            Self::Noughties => (2000..2010).contains(&year),
            Self::Before2000 => year < 2000,
        }
    }
}

impl FromStr for YearBucket {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "2020s" => Ok(Self::Twenties),
            "2010s" => Ok(Self::Tens),
            "2000s" => Ok(Self::Noughties),
            "before2000" => Ok(Self::Before2000),
            other => Err(unknown("year", other)),
        }
    }
}

/// Book list filter; `None` fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Category, compared case-insensitively
    pub category: Option<String>,
    /// Copies on the shelf
    pub availability: Option<Availability>,
    /// Publication decade
    pub year: Option<YearBucket>,
    /// Substring of title, author name or description
    pub search: Option<String>,
}

impl BookFilter {
    /// Whether `book` passes every set criterion
    #[must_use]
    pub fn matches(&self, book: &Book) -> bool {
        self.matches_with(book, needle(self.search.as_deref()).as_deref())
    }

    fn matches_with(&self, book: &Book, search: Option<&str>) -> bool {
        if let Some(category) = &self.category {
            if book.category.to_lowercase() != category.trim().to_lowercase() {
                return false;
            }
        }

        match self.availability {
            Some(Availability::Available) if !book.is_available() => return false,
            Some(Availability::Unavailable) if book.is_available() => return false,
            _ => {}
        }

        if let Some(bucket) = self.year {
            if !bucket.contains(book.publishing_year) {
                return false;
            }
        }

        search.map_or(true, |needle| {
            contains_ci(&book.title, needle)
                || book.author_name.as_deref().is_some_and(|a| contains_ci(a, needle))
                || book.description.as_deref().is_some_and(|d| contains_ci(d, needle))
        })
    }

    /// Books passing the filter, in their original order
    #[must_use]
    pub fn apply(&self, books: &[Book]) -> Vec<Book> {
        let search = needle(self.search.as_deref());
        books
            .iter()
            .filter(|book| self.matches_with(book, search.as_deref()))
            .cloned()
            .collect()
    }
}

/// Book list orderings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BookSort {
    /// Title A to Z
    #[default]
    Title,
    /// Title Z to A
    TitleDesc,
    /// Oldest first
    Year,
    /// Newest first
    YearDesc,
    /// Author name A to Z, unknown authors last
    Author,
    /// Most copies on the shelf first
    Availability,
}

impl BookSort {
    fn compare(self, a: &Book, b: &Book) -> Ordering {
        match self {
            Self::Title => by_title(a, b),
            Self::TitleDesc => by_title(b, a),
            Self::Year => a.publishing_year.cmp(&b.publishing_year),
            Self::YearDesc => b.publishing_year.cmp(&a.publishing_year),
            Self::Author => match (&a.author_name, &b.author_name) {
                (Some(x), Some(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            Self::Availability => b.available_copies.cmp(&a.available_copies),
        }
    }

    /// Stable in-place sort
    pub fn sort(self, books: &mut [Book]) {
        books.sort_by(|a, b| self.compare(a, b));
    }
}

fn by_title(a: &Book, b: &Book) -> Ordering {
    a.title
        .to_lowercase()
        .cmp(&b.title.to_lowercase())
        .then_with(|| a.title.cmp(&b.title))
}

impl FromStr for BookSort {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "title-desc" | "titledesc" => Ok(Self::TitleDesc),
            "year" => Ok(Self::Year),
            "year-desc" | "yeardesc" => Ok(Self::YearDesc),
            "author" => Ok(Self::Author),
            "availability" => Ok(Self::Availability),
            other => Err(unknown("sort", other)),
        }
    }
}

/// Filter, sort and slice one page of books
#[must_use]
pub fn page(books: &[Book], filter: &BookFilter, sort: BookSort, page: usize, per_page: usize) -> Page<Book> {
    let mut items = filter.apply(books);
    sort.sort(&mut items);
    paginate(items, page, per_page)
}
