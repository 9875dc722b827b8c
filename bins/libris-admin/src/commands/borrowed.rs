//! Borrowed books command

use super::PageArgs;
use crate::context::Context;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use libris_api_client::models::{BorrowRequest, BorrowStatus, BorrowedBook, BorrowedBookUpdateRequest, BorrowingStats};
use libris_api_client::views::{self, BorrowedBookFilter, BorrowedBookSort};
use libris_cli::output::{format_count, format_money, format_page, truncate};
use libris_cli::Status;
use libris_core::listing::Page;
use owo_colors::OwoColorize;

#[derive(Subcommand)]
pub enum BorrowedCommand {
    /// List borrowing records, filtered and sorted locally
    List {
        /// Text in the title, author, member or status
        #[arg(long)]
        search: Option<String>,

        /// borrowed, returned, overdue or lost
        #[arg(long)]
        status: Option<BorrowStatus>,

        /// latest, due-date, member, title or status
        #[arg(long, default_value = "latest")]
        sort: BorrowedBookSort,

        #[command(flatten)]
        paging: PageArgs,
    },

    /// Show one record
    Show { id: i64 },

    /// Lend a book to a member
    Borrow {
        #[arg(long)]
        book: i64,

        #[arg(long)]
        member: i64,

        /// Due date (YYYY-MM-DD), borrowed today
        #[arg(long)]
        due: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Mark a record returned
    Return { id: i64 },

    /// Push the due date back
    Extend {
        id: i64,

        #[arg(long, default_value = "14")]
        days: u32,
    },

    /// Change fields of a record, keeping the rest
    Update {
        id: i64,

        #[arg(long)]
        due: Option<NaiveDate>,

        #[arg(long)]
        status: Option<BorrowStatus>,

        #[arg(long)]
        returned: Option<NaiveDate>,

        #[arg(long)]
        fine: Option<f64>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a record
    Delete { id: i64 },

    /// Quick search across titles, authors and members
    Search { query: String },

    /// A member's borrowing records
    Member {
        id: i64,

        /// Only books still out
        #[arg(long, conflicts_with = "fines")]
        current: bool,

        /// Total outstanding fines
        #[arg(long)]
        fines: bool,
    },

    /// Records past their due date
    Overdue,

    /// Records due today
    DueToday,

    /// Records due in the next N days
    DueWithin { days: u32 },

    /// Records in one status
    Status { status: BorrowStatus },

    /// Records borrowed between two dates (YYYY-MM-DD)
    Range { start: NaiveDate, end: NaiveDate },

    /// Aggregate numbers
    Stats,

    /// Ask the server to flag overdue records
    UpdateOverdue,
}

/// Run a borrowed subcommand
pub async fn run(ctx: &Context, command: BorrowedCommand) -> Result<()> {
    let borrowed = ctx.queries().borrowed_books();

    match command {
        BorrowedCommand::List { search, status, sort, paging } => {
            let all = ctx.load("borrowed books", borrowed.all()).await?;
            let filter = BorrowedBookFilter { search, status };
            let page = views::borrowed_books::page(&all, &filter, sort, paging.index(), paging.per_page);
            ctx.emit(&page, print_page)
        }
        BorrowedCommand::Show { id } => {
            let record = ctx.load("record", borrowed.detail(Some(id))).await?;
            ctx.emit(&record, print_detail)
        }
        BorrowedCommand::Borrow { book, member, due, notes } => {
            let mut request = BorrowRequest::new(book, member);
            if let Some(due) = due {
                request = request.with_dates(Local::now().date_naive(), due);
            }
            if let Some(notes) = notes {
                request = request.with_notes(notes);
            }
            let record = ctx.write("Borrowing book", borrowed.borrow(&request)).await?;
            ctx.emit(&record, |r| {
                Status::success(&format!("Record #{} created, due {}", r.id, r.due_date));
            })
        }
        BorrowedCommand::Return { id } => {
            let record = ctx.write("Returning book", borrowed.return_book(id)).await?;
            ctx.emit(&record, |r| {
                Status::success(&format!("Record #{} returned", r.id));
                if r.fine_amount > 0.0 {
                    Status::warning(&format!("Fine due: {}", format_money(r.fine_amount)));
                }
            })
        }
        BorrowedCommand::Extend { id, days } => {
            let record = ctx
                .write("Extending due date", borrowed.extend_due_date(id, days))
                .await?;
            ctx.emit(&record, |r| {
                Status::success(&format!("Record #{} now due {}", r.id, r.due_date));
            })
        }
        BorrowedCommand::Update { id, due, status, returned, fine, notes } => {
            let current = ctx.load("record", borrowed.detail(Some(id))).await?;
            let mut request = BorrowedBookUpdateRequest::from_record(&current);
            if due.is_some() {
                request.due_date = due;
            }
            if status.is_some() {
                request.status = status;
            }
            if returned.is_some() {
                request.return_date = returned;
            }
            if fine.is_some() {
                request.fine_amount = fine;
            }
            if notes.is_some() {
                request.notes = notes;
            }
            let record = ctx.write("Updating record", borrowed.update(id, &request)).await?;
            ctx.emit(&record, |r| Status::success(&format!("Updated record #{}", r.id)))
        }
        BorrowedCommand::Delete { id } => {
            ctx.write("Deleting record", borrowed.delete(id)).await?;
            ctx.emit(&serde_json::json!({ "deleted": id }), |_| {
                Status::success(&format!("Deleted record #{id}"));
            })
        }
        BorrowedCommand::Search { query } => {
            let found = ctx.load("records", borrowed.quick_search(&query)).await?;
            ctx.emit(&found, |found| print_list(found))
        }
        BorrowedCommand::Member { id, current, fines } => {
            if fines {
                let total = ctx.load("fines", borrowed.member_fines(id)).await?;
                return ctx.emit(&serde_json::json!({ "memberId": id, "fines": total }), |_| {
                    Status::detail("Outstanding fines", &format_money(total));
                });
            }
            let records = if current {
                ctx.load("records", borrowed.current_by_member(id)).await?
            } else {
                ctx.load("records", borrowed.by_member(id)).await?
            };
            ctx.emit(&records, |records| print_list(records))
        }
        BorrowedCommand::Overdue => {
            let records = ctx.load("overdue records", borrowed.overdue()).await?;
            ctx.emit(&records, |records| print_list(records))
        }
        BorrowedCommand::DueToday => {
            let records = ctx.load("records due today", borrowed.due_today()).await?;
            ctx.emit(&records, |records| print_list(records))
        }
        BorrowedCommand::DueWithin { days } => {
            let records = ctx.load("records", borrowed.due_within(days)).await?;
            ctx.emit(&records, |records| print_list(records))
        }
        BorrowedCommand::Status { status } => {
            let records = ctx.load("records", borrowed.by_status(Some(status))).await?;
            ctx.emit(&records, |records| print_list(records))
        }
        BorrowedCommand::Range { start, end } => {
            let records = ctx
                .load("records", borrowed.by_date_range(Some(start), Some(end)))
                .await?;
            ctx.emit(&records, |records| print_list(records))
        }
        BorrowedCommand::Stats => {
            let stats = ctx.load("statistics", borrowed.statistics()).await?;
            ctx.emit(&stats, print_stats)
        }
        BorrowedCommand::UpdateOverdue => {
            ctx.write("Updating overdue records", borrowed.update_overdue()).await?;
            ctx.emit(&serde_json::json!({ "updated": true }), |_| {
                Status::success("Overdue records updated");
            })
        }
    }
}

fn status_label(status: BorrowStatus) -> String {
    match status {
        BorrowStatus::Borrowed => status.as_str().cyan().to_string(),
        BorrowStatus::Returned => status.as_str().green().to_string(),
        BorrowStatus::Overdue | BorrowStatus::Lost => status.as_str().red().to_string(),
    }
}

fn print_row(record: &BorrowedBook) {
    println!(
        "  {:>5}  {:<32} {:<20} due {}  {}",
        format!("#{}", record.id).dimmed(),
        truncate(record.book_title.as_deref().unwrap_or("?"), 32),
        truncate(record.member_name.as_deref().unwrap_or("?"), 20),
        record.due_date,
        status_label(record.status)
    );
}

fn print_list(records: &[BorrowedBook]) {
    Status::header(&format_count(records.len(), "record", "records"));
    records.iter().for_each(print_row);
}

fn print_page(page: &Page<BorrowedBook>) {
    Status::header(&format_page(page, "record", "records"));
    page.items.iter().for_each(print_row);
}

fn print_detail(record: &BorrowedBook) {
    Status::header(&format!("Record #{}", record.id));
    let book = record.book_title.as_deref().unwrap_or("?");
    Status::detail("Book", &format!("{book} (#{})", record.book_id));
    if let Some(author) = &record.author_name {
        Status::detail("Author", author);
    }
    let member = record.member_name.as_deref().unwrap_or("?");
    Status::detail("Member", &format!("{member} (#{})", record.member_id));
    Status::detail("Borrowed", &record.borrow_date.to_string());
    Status::detail("Due", &record.due_date.to_string());
    if let Some(returned) = record.return_date {
        Status::detail("Returned", &returned.to_string());
    }
    Status::detail("Status", &status_label(record.status));
    if record.fine_amount > 0.0 {
        Status::detail("Fine", &format_money(record.fine_amount));
    }
    if let Some(notes) = &record.notes {
        Status::detail("Notes", notes);
    }
}

fn print_stats(stats: &BorrowingStats) {
    Status::header("Borrowing statistics");
    Status::detail("Total", &stats.total_borrowings.to_string());
    Status::detail("Out now", &stats.currently_borrowed.to_string());
    Status::detail("Overdue", &stats.overdue_books.to_string());
    Status::detail("Returned", &stats.returned_books.to_string());
    Status::detail("Fines collected", &format_money(stats.total_fines_collected));
}
