//! CLI command implementations

pub mod authors;
pub mod books;
pub mod borrowed;
pub mod members;

use clap::Args;

/// Client-side paging of a fetched list
#[derive(Debug, Clone, Copy, Args)]
pub struct PageArgs {
    /// Page to show, starting at 1
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Items per page
    #[arg(long, default_value = "20")]
    pub per_page: usize,
}

impl PageArgs {
    /// 0-based page index
    pub fn index(self) -> usize {
        self.page.saturating_sub(1)
    }
}
