//! CLI module
//!
//! Terminal front end for a paginated list.
//!
//! # Commands
//!
//! - `drain` - Load every page, waiting out retry countdowns
//! - `browse` - Send intents typed on stdin and print every transition
//! - `config` - Print the effective configuration

mod commands;
mod messages;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use messages::{LogLevel, Message};
pub use runner::{drain, BrowseCommand, DrainOptions, DrainSummary, Runner};
