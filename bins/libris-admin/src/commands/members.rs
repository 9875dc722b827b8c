//! Members command

use super::PageArgs;
use crate::context::Context;
use anyhow::Result;
use clap::{Args, Subcommand};
use libris_api_client::models::{Member, MemberCreateRequest, MembershipStatus};
use libris_api_client::views::{self, MemberFilter, MemberSort, MemberSortField};
use libris_cli::output::{format_count, format_page, truncate};
use libris_cli::Status;
use libris_core::listing::Page;
use owo_colors::OwoColorize;

#[derive(Subcommand)]
pub enum MemberCommand {
    /// List members, filtered and sorted locally
    List {
        /// Text in the member's name
        #[arg(long)]
        name: Option<String>,

        /// name, email, status or date
        #[arg(long, default_value = "name")]
        sort: MemberSortField,

        /// Reverse the order
        #[arg(long)]
        desc: bool,

        #[command(flatten)]
        paging: PageArgs,
    },

    /// Show one member
    Show {
        id: i64,

        /// Include the member's borrowing history
        #[arg(long)]
        borrowed: bool,
    },

    /// Server-side search by name or email
    Search { term: String },

    /// Look a member up by email
    FindEmail { email: String },

    /// Register a member
    Create(MemberFields),

    /// Replace a member's details
    Update {
        id: i64,

        #[command(flatten)]
        fields: MemberFields,
    },

    /// Delete a member
    Delete { id: i64 },
}

#[derive(Args)]
pub struct MemberFields {
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    phone: Option<String>,

    #[arg(long)]
    address: Option<String>,

    /// active, inactive, suspended or expired
    #[arg(long)]
    status: Option<MembershipStatus>,
}

impl MemberFields {
    fn into_request(self) -> MemberCreateRequest {
        let mut request = MemberCreateRequest::new(self.name, self.email);
        if let Some(phone) = self.phone {
            request = request.with_phone(phone);
        }
        if let Some(address) = self.address {
            request = request.with_address(address);
        }
        if let Some(status) = self.status {
            request = request.with_status(status);
        }
        request
    }
}

/// Run a members subcommand
pub async fn run(ctx: &Context, command: MemberCommand) -> Result<()> {
    let members = ctx.queries().members();

    match command {
        MemberCommand::List { name, sort, desc, paging } => {
            let all = ctx.load("members", members.all()).await?;
            let order = if desc {
                MemberSort::by(sort).descending()
            } else {
                MemberSort::by(sort)
            };
            let page = views::members::page(&all, &MemberFilter { name }, order, paging.index(), paging.per_page);
            ctx.emit(&page, print_page)
        }
        MemberCommand::Show { id, borrowed } => {
            let member = if borrowed {
                ctx.load("member", members.with_borrowed_books(Some(id))).await?
            } else {
                ctx.load("member", members.detail(Some(id))).await?
            };
            ctx.emit(&member, print_detail)
        }
        MemberCommand::Search { term } => {
            let found = ctx.load("members", members.search(&term)).await?;
            ctx.emit(&found, |found| {
                Status::header(&format_count(found.len(), "member", "members"));
                found.iter().for_each(print_row);
            })
        }
        MemberCommand::FindEmail { email } => {
            let member = ctx.load("member", members.by_email(&email)).await?;
            ctx.emit(&member, print_detail)
        }
        MemberCommand::Create(fields) => {
            let member = ctx
                .write("Creating member", members.create(&fields.into_request()))
                .await?;
            ctx.emit(&member, |m| Status::success(&format!("Created member #{} {}", m.id, m.name)))
        }
        MemberCommand::Update { id, fields } => {
            let member = ctx
                .write("Updating member", members.update(id, &fields.into_request()))
                .await?;
            ctx.emit(&member, |m| Status::success(&format!("Updated member #{} {}", m.id, m.name)))
        }
        MemberCommand::Delete { id } => {
            ctx.write("Deleting member", members.delete(id)).await?;
            ctx.emit(&serde_json::json!({ "deleted": id }), |_| {
                Status::success(&format!("Deleted member #{id}"));
            })
        }
    }
}

fn status_label(status: Option<MembershipStatus>) -> String {
    match status {
        Some(MembershipStatus::Active) => "ACTIVE".green().to_string(),
        Some(other) => other.as_str().yellow().to_string(),
        None => "-".dimmed().to_string(),
    }
}

fn print_row(member: &Member) {
    println!(
        "  {:>5}  {:<28} {:<32} {}",
        format!("#{}", member.id).dimmed(),
        truncate(&member.name, 28),
        truncate(&member.email, 32),
        status_label(member.membership_status)
    );
}

fn print_page(page: &Page<Member>) {
    Status::header(&format_page(page, "member", "members"));
    page.items.iter().for_each(print_row);
}

fn print_detail(member: &Member) {
    Status::header(&member.name);
    Status::detail("Id", &member.id.to_string());
    Status::detail("Email", &member.email);
    if let Some(phone) = &member.phone {
        Status::detail("Phone", phone);
    }
    if let Some(address) = &member.address {
        Status::detail("Address", address);
    }
    if let Some(since) = &member.membership_date {
        Status::detail("Member since", since);
    }
    Status::detail("Status", &status_label(member.membership_status));

    if let Some(records) = &member.borrowed_books {
        println!();
        Status::info(&format_count(records.len(), "borrowing", "borrowings"));
        for record in records {
            println!(
                "  {:>5}  {:<40} due {}  {}",
                format!("#{}", record.id).dimmed(),
                truncate(record.book_title.as_deref().unwrap_or("?"), 40),
                record.due_date,
                record.status
            );
        }
    }
}
