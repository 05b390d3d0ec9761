//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Paginated feed loader
#[derive(Parser, Debug)]
#[command(name = "pagefeed")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Feed configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load every page, waiting out retry countdowns on failure
    Drain {
        /// Stop after this many records
        #[arg(long)]
        max_records: Option<usize>,

        /// Give up after this many failed fetches in a row
        #[arg(long, default_value = "3")]
        max_failures: u32,
    },

    /// Drive the list interactively from stdin
    ///
    /// Commands: more, row <index>, retry, refresh, pull, show, quit
    Browse,

    /// Print the effective configuration
    Config,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
