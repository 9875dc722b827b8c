//! Books command

use super::PageArgs;
use crate::context::Context;
use anyhow::Result;
use clap::{Args, Subcommand};
use libris_api_client::models::{Book, BookCreateRequest, BookFilters, BookSearch, BookSummary};
use libris_api_client::views::{self, Availability, BookFilter, BookSort, YearBucket};
use libris_cli::output::{format_copies, format_count, format_page, truncate};
use libris_cli::Status;
use libris_core::listing::Page;
use owo_colors::OwoColorize;

#[derive(Subcommand)]
pub enum BookCommand {
    /// List books, filtered and sorted locally
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// title, title-desc, year, year-desc, author, availability
        #[arg(long, default_value = "title")]
        sort: BookSort,

        #[command(flatten)]
        paging: PageArgs,
    },

    /// Show one book
    Show { id: i64 },

    /// Server-side search
    Search {
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        author: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        isbn: Option<String>,

        /// Only books with copies on the shelf
        #[arg(long)]
        available_only: bool,
    },

    /// Books with copies on the shelf
    Available,

    /// Books in one category
    Category { name: String },

    /// Category names
    Categories,

    /// Compact listing straight from the server
    Summaries {
        #[arg(long)]
        genre: Option<String>,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long)]
        author_id: Option<i64>,
    },

    /// Add a book
    Create(BookFields),

    /// Replace a book's details
    Update {
        id: i64,

        #[command(flatten)]
        fields: BookFields,
    },

    /// Delete a book
    Delete { id: i64 },
}

#[derive(Args)]
pub struct FilterArgs {
    /// Category, case-insensitive
    #[arg(long)]
    category: Option<String>,

    /// available or unavailable
    #[arg(long)]
    availability: Option<Availability>,

    /// 2020s, 2010s, 2000s or before2000
    #[arg(long)]
    year: Option<YearBucket>,

    /// Text in title, author or description
    #[arg(long)]
    search: Option<String>,
}

impl From<FilterArgs> for BookFilter {
    fn from(args: FilterArgs) -> Self {
        Self {
            category: args.category,
            availability: args.availability,
            year: args.year,
            search: args.search,
        }
    }
}

#[derive(Args)]
pub struct BookFields {
    #[arg(long)]
    title: String,

    #[arg(long)]
    category: String,

    #[arg(long)]
    year: i32,

    #[arg(long)]
    author_id: i64,

    #[arg(long)]
    isbn: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Copies owned
    #[arg(long)]
    copies: Option<u32>,

    /// Copies on the shelf, defaults to all copies
    #[arg(long, requires = "copies")]
    available: Option<u32>,
}

impl BookFields {
    fn into_request(self) -> BookCreateRequest {
        let mut request = BookCreateRequest::new(self.title, self.category, self.year, self.author_id);
        if let Some(total) = self.copies {
            request = request.with_copies(total, self.available.unwrap_or(total));
        }
        if let Some(isbn) = self.isbn {
            request = request.with_isbn(isbn);
        }
        if let Some(description) = self.description {
            request = request.with_description(description);
        }
        request
    }
}

/// Run a books subcommand
pub async fn run(ctx: &Context, command: BookCommand) -> Result<()> {
    let books = ctx.queries().books();

    match command {
        BookCommand::List { filter, sort, paging } => {
            let all = ctx.load("books", books.all()).await?;
            let page = views::books::page(&all, &filter.into(), sort, paging.index(), paging.per_page);
            ctx.emit(&page, print_page)
        }
        BookCommand::Show { id } => {
            let book = ctx.load("book", books.detail(Some(id))).await?;
            ctx.emit(&book, print_detail)
        }
        BookCommand::Search { title, author, category, isbn, available_only } => {
            let search = BookSearch {
                title,
                author_name: author,
                category,
                isbn,
                available_only: available_only.then_some(true),
                ..BookSearch::default()
            };
            let found = ctx.load("search results", books.search(&search)).await?;
            ctx.emit(&found, |found| print_list(found))
        }
        BookCommand::Available => {
            let list = ctx.load("available books", books.available()).await?;
            ctx.emit(&list, |list| print_list(list))
        }
        BookCommand::Category { name } => {
            let list = ctx.load("books", books.by_category(&name)).await?;
            ctx.emit(&list, |list| print_list(list))
        }
        BookCommand::Categories => {
            let categories = ctx.load("categories", books.categories()).await?;
            ctx.emit(&categories, |categories| {
                Status::header(&format_count(categories.len(), "category", "categories"));
                for category in categories {
                    println!("  {category}");
                }
            })
        }
        BookCommand::Summaries { genre, year, author_id } => {
            let filters = BookFilters {
                genre,
                publication_year: year,
                author_id,
                ..BookFilters::default()
            };
            let summaries = ctx.load("summaries", books.summaries(Some(&filters))).await?;
            ctx.emit(&summaries, |summaries| print_summaries(summaries))
        }
        BookCommand::Create(fields) => {
            let book = ctx
                .write("Creating book", books.create(&fields.into_request()))
                .await?;
            ctx.emit(&book, |b| Status::success(&format!("Created book #{} {}", b.id, b.title)))
        }
        BookCommand::Update { id, fields } => {
            let book = ctx
                .write("Updating book", books.update(id, &fields.into_request()))
                .await?;
            ctx.emit(&book, |b| Status::success(&format!("Updated book #{} {}", b.id, b.title)))
        }
        BookCommand::Delete { id } => {
            ctx.write("Deleting book", books.delete(id)).await?;
            ctx.emit(&serde_json::json!({ "deleted": id }), |_| {
                Status::success(&format!("Deleted book #{id}"));
            })
        }
    }
}

fn print_row(book: &Book) {
    let copies = format_copies(book.available_copies, book.total_copies);
    println!(
        "  {:>5}  {:<40} {:<16} {}  {}",
        format!("#{}", book.id).dimmed(),
        truncate(&book.title, 40),
        truncate(&book.category, 16),
        book.publishing_year,
        if book.is_available() {
            copies.green().to_string()
        } else {
            copies.red().to_string()
        }
    );
}

fn print_list(books: &[Book]) {
    Status::header(&format_count(books.len(), "book", "books"));
    books.iter().for_each(print_row);
}

fn print_page(page: &Page<Book>) {
    Status::header(&format_page(page, "book", "books"));
    page.items.iter().for_each(print_row);
}

fn print_summaries(summaries: &[BookSummary]) {
    Status::header(&format_count(summaries.len(), "book", "books"));
    for book in summaries {
        println!(
            "  {:>5}  {:<40} {}",
            format!("#{}", book.id).dimmed(),
            truncate(&book.title, 40),
            format_copies(book.available_copies, book.total_copies)
        );
    }
}

fn print_detail(book: &Book) {
    Status::header(&book.title);
    Status::detail("Id", &book.id.to_string());
    Status::detail("Category", &book.category);
    Status::detail("Published", &book.publishing_year.to_string());
    if let Some(author) = &book.author_name {
        Status::detail("Author", &format!("{author} (#{})", book.author_id));
    }
    if let Some(isbn) = &book.isbn {
        Status::detail("ISBN", isbn);
    }
    Status::detail("Copies", &format_copies(book.available_copies, book.total_copies));
    if let Some(description) = &book.description {
        Status::detail("Description", description);
    }
}
