//! Libris admin CLI
//!
//! Manage authors, books, members and loans of a Libris library from the terminal.

use clap::{Parser, Subcommand};
use libris_cli::{OutputFormat, Status};
use libris_telemetry::{LogFormat, TelemetryConfig};
use std::process::ExitCode;

mod commands;
mod context;

use commands::{authors, books, borrowed, members};
use context::Context;

/// Library administration from the command line
#[derive(Parser)]
#[command(name = "libris-admin")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    /// API base URL
    #[arg(long, global = true, env = "LIBRIS_API_URL")]
    api_url: Option<String>,

    /// Fail on the first error instead of retrying
    #[arg(long, global = true)]
    no_retry: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage authors
    Authors {
        #[command(subcommand)]
        command: authors::AuthorCommand,
    },

    /// Manage the catalogue
    Books {
        #[command(subcommand)]
        command: books::BookCommand,
    },

    /// Manage members
    Members {
        #[command(subcommand)]
        command: members::MemberCommand,
    },

    /// Lend, return and track books
    Borrowed {
        #[command(subcommand)]
        command: borrowed::BorrowedCommand,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_format = if cli.format.is_json() {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    if let Err(e) = libris_telemetry::init_with_config(TelemetryConfig::for_cli(cli.verbose, log_format)) {
        Status::warning(&format!("Logging disabled: {e}"));
    }

    let ctx = match Context::new(cli.api_url.as_deref(), cli.format, cli.no_retry) {
        Ok(ctx) => ctx,
        Err(e) => {
            Status::error(&format!("{e:#}"));
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Authors { command } => authors::run(&ctx, command).await,
        Commands::Books { command } => books::run(&ctx, command).await,
        Commands::Members { command } => members::run(&ctx, command).await,
        Commands::Borrowed { command } => borrowed::run(&ctx, command).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Status::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["libris-admin", "books", "categories", "--format", "json", "-v"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
