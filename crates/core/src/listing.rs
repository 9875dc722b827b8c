//! Client-side pagination
//!
//! Pages are 0-based. A page past the end is empty but still reports the real
//! totals, so a view can render "page 7 of 3" without a second pass.

use serde::Serialize;

/// One page of an already filtered and sorted list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// 0-based page index
    pub page: usize,
    /// Requested page size
    pub per_page: usize,
    /// Items across all pages
    pub total_items: usize,
    /// Number of non-empty pages
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Whether a page follows this one
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }

    /// Whether a page precedes this one
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.page > 0 && self.total_pages > 0
    }

    /// Map the items, keeping the paging numbers
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Slice `items` into page `page` of size `per_page`
///
/// A `per_page` of zero is treated as one.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);

    let start = page.saturating_mul(per_page);
    let page_items = if start >= total_items {
        Vec::new()
    } else {
        items.into_iter().skip(start).take(per_page).collect()
    };

    Page {
        items: page_items,
        page,
        per_page,
        total_items,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_and_last_page() {
        let first = paginate((1..=25).collect::<Vec<_>>(), 0, 10);
        assert_eq!(first.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next());
        assert!(!first.has_previous());

        let last = paginate((1..=25).collect::<Vec<_>>(), 2, 10);
        assert_eq!(last.items, vec![21, 22, 23, 24, 25]);
        assert!(!last.has_next());
        assert!(last.has_previous());
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let page = paginate(vec!["a", "b"], 5, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 2);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_empty_input() {
        let page = paginate(Vec::<u8>::new(), 0, 10);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn test_zero_page_size() {
        let page = paginate(vec![1, 2, 3], 1, 0);
        assert_eq!(page.per_page, 1);
        assert_eq!(page.items, vec![2]);
    }

    #[test]
    fn test_map_keeps_numbers() {
        let page = paginate(vec![1, 2, 3], 0, 2).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.total_pages, 2);
    }

    proptest! {
        #[test]
        fn prop_pages_cover_all_items(len in 0usize..200, per_page in 1usize..30) {
            let items: Vec<usize> = (0..len).collect();
            let total_pages = paginate(items.clone(), 0, per_page).total_pages;

            let joined: Vec<usize> = (0..total_pages)
                .flat_map(|p| paginate(items.clone(), p, per_page).items)
                .collect();
            prop_assert_eq!(joined, items);
        }

        #[test]
        fn prop_page_never_exceeds_size(len in 0usize..200, page in 0usize..50, per_page in 1usize..30) {
            let result = paginate((0..len).collect::<Vec<_>>(), page, per_page);
            prop_assert!(result.items.len() <= per_page);
        }
    }
}
