//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output.

use libris_core::listing::Page;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// How command results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// Pretty-printed JSON on stdout
    Json,
}

impl OutputFormat {
    /// Whether output is JSON
    #[must_use]
    pub fn is_json(self) -> bool {
        self == Self::Json
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }

    /// Print a dimmed detail line under an item
    pub fn detail(label: &str, value: &str) {
        println!("  {} {}", format!("{label}:").dimmed(), value);
    }
}

/// Print `value` as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

/// Format a fine or fee
pub fn format_money(amount: f64) -> String {
    format!("${amount:.2}")
}

/// Format copies on the shelf, e.g. `2/3 available`
pub fn format_copies(available: u32, total: u32) -> String {
    format!("{available}/{total} available")
}

/// Footer line for a page of results
pub fn format_page<T>(page: &Page<T>, singular: &str, plural: &str) -> String {
    if page.total_pages == 0 {
        return format!("No {plural}");
    }
    format!(
        "Page {} of {} ({})",
        page.page + 1,
        page.total_pages,
        format_count(page.total_items, singular, plural)
    )
}

/// Cut `text` to `width` characters, ending with an ellipsis when shortened
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}
