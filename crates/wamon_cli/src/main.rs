//! `wamon` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments and route them to command handlers.
//! - Resolve config, logging, and the database before any command runs.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wamon_core::{Category, MAX_SATISFACTION, MIN_SATISFACTION};

mod commands;
mod duration;

#[derive(Parser)]
#[command(
    name = "wamon",
    version,
    about = "Journal research and programming activities"
)]
struct Cli {
    /// Database file path (overrides config and WAMON_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file path (default: ~/.wamon/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a new activity
    Add {
        /// research | programming | both
        #[arg(short, long, value_parser = parse_category)]
        category: Category,
        /// What was researched
        #[arg(long, default_value = "")]
        topic: String,
        /// What was programmed
        #[arg(long, default_value = "")]
        title: String,
        /// Satisfaction from 1 to 5
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(satisfaction_range()))]
        satisfaction: u8,
    },
    /// Change fields of an existing entry
    Edit {
        id: String,
        #[arg(short, long, value_parser = parse_category)]
        category: Option<Category>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(satisfaction_range()))]
        satisfaction: Option<u8>,
    },
    /// Show one entry
    Show { id: String },
    /// List entries, newest first
    List {
        /// Only entries of this category
        #[arg(short, long, value_parser = parse_category)]
        category: Option<Category>,
    },
    /// Print the number of stored entries
    Count,
    /// Export entries as JSON Lines
    Export {
        /// Output file
        #[arg(default_value = "wamon_export.json")]
        file: PathBuf,
        /// Only entries newer than this window (e.g. 24h, 168h, 1h30m)
        #[arg(long, value_parser = duration::parse_duration)]
        since: Option<chrono::Duration>,
    },
    /// Import entries from a JSON Lines export; existing ids are skipped
    Import { file: PathBuf },
    /// Summarize the last seven days
    Report,
    /// Open (or create) the database at the current path and save it to the config file
    SetDb,
}

fn parse_category(value: &str) -> Result<Category, String> {
    Category::from_user_input(value).ok_or_else(|| {
        format!(
            "unknown category `{value}`; expected research, programming, both, {}",
            Category::ALL
                .iter()
                .map(|category| category.as_tag())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}

fn satisfaction_range() -> std::ops::RangeInclusive<i64> {
    i64::from(MIN_SATISFACTION)..=i64::from(MAX_SATISFACTION)
}

fn main() {
    let cli = Cli::parse();
    let result = commands::run(cli.command, cli.db, cli.config);

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
