//! Authors command

use crate::context::Context;
use anyhow::Result;
use clap::{Args, Subcommand};
use libris_api_client::models::{Author, AuthorCreateRequest};
use libris_cli::output::{format_count, format_copies};
use libris_cli::Status;
use owo_colors::OwoColorize;

#[derive(Subcommand)]
pub enum AuthorCommand {
    /// List authors
    List {
        /// Only authors of this nationality
        #[arg(long)]
        nationality: Option<String>,

        /// Search by name
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one author
    Show {
        id: i64,

        /// Include the author's books
        #[arg(long)]
        books: bool,
    },

    /// Add an author
    Create(AuthorFields),

    /// Replace an author's details
    Update {
        id: i64,

        #[command(flatten)]
        fields: AuthorFields,
    },

    /// Delete an author
    Delete { id: i64 },
}

#[derive(Args)]
pub struct AuthorFields {
    #[arg(long)]
    name: String,

    #[arg(long)]
    nationality: String,

    #[arg(long)]
    biography: Option<String>,

    #[arg(long)]
    birth_year: Option<i32>,
}

impl AuthorFields {
    fn into_request(self) -> AuthorCreateRequest {
        let mut request = AuthorCreateRequest::new(self.name, self.nationality);
        if let Some(biography) = self.biography {
            request = request.with_biography(biography);
        }
        if let Some(year) = self.birth_year {
            request = request.with_birth_year(year);
        }
        request
    }
}

/// Run an authors subcommand
pub async fn run(ctx: &Context, command: AuthorCommand) -> Result<()> {
    let authors = ctx.queries().authors();

    match command {
        AuthorCommand::List { nationality, search } => {
            let list = match (nationality, search) {
                (Some(n), _) => ctx.load("authors", authors.by_nationality(&n)).await?,
                (None, Some(s)) => ctx.load("authors", authors.search_by_name(&s)).await?,
                (None, None) => ctx.load("authors", authors.all()).await?,
            };
            ctx.emit(&list, |list| print_list(list))
        }
        AuthorCommand::Show { id, books } => {
            let author = if books {
                ctx.load("author", authors.with_books(Some(id))).await?
            } else {
                ctx.load("author", authors.detail(Some(id))).await?
            };
            ctx.emit(&author, print_detail)
        }
        AuthorCommand::Create(fields) => {
            let author = ctx
                .write("Creating author", authors.create(&fields.into_request()))
                .await?;
            ctx.emit(&author, |a| Status::success(&format!("Created author #{} {}", a.id, a.name)))
        }
        AuthorCommand::Update { id, fields } => {
            let author = ctx
                .write("Updating author", authors.update(id, &fields.into_request()))
                .await?;
            ctx.emit(&author, |a| Status::success(&format!("Updated author #{} {}", a.id, a.name)))
        }
        AuthorCommand::Delete { id } => {
            ctx.write("Deleting author", authors.delete(id)).await?;
            ctx.emit(&serde_json::json!({ "deleted": id }), |_| {
                Status::success(&format!("Deleted author #{id}"));
            })
        }
    }
}

fn print_list(authors: &[Author]) {
    Status::header(&format_count(authors.len(), "author", "authors"));
    for author in authors {
        println!(
            "  {:>5}  {}  {}",
            format!("#{}", author.id).dimmed(),
            author.name.bold(),
            author.nationality.dimmed()
        );
    }
}

fn print_detail(author: &Author) {
    Status::header(&author.name);
    Status::detail("Id", &author.id.to_string());
    Status::detail("Nationality", &author.nationality);
    if let Some(year) = author.birth_year {
        Status::detail("Born", &year.to_string());
    }
    if let Some(biography) = &author.biography {
        Status::detail("Biography", biography);
    }
    if let Some(books) = &author.books {
        println!();
        for book in books {
            println!(
                "  {} ({})  {}",
                book.title,
                book.publishing_year,
                format_copies(book.available_copies, book.total_copies).dimmed()
            );
        }
    }
}
