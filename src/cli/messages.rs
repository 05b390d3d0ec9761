//! Messages emitted by the CLI
//!
//! Every line of `--format json` output is one of these, tagged by `type`.

use crate::store::Snapshot;
use crate::types::Record;
use serde_json::{json, Value};

/// A message emitted while driving a list
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A record newly appended to the list
    Record {
        /// Position in the list
        index: usize,
        /// The record
        record: Record,
    },
    /// List state after a transition
    State {
        /// State data (phase, cursor, banners)
        data: Value,
    },
    /// Log message
    Log {
        /// Log level
        level: LogLevel,
        /// Log message
        message: String,
    },
}

/// Log level for CLI messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// General information
    Info,
    /// Warning
    Warn,
    /// Error (non-fatal)
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl Message {
    /// Create a record message
    pub fn record(index: usize, record: Record) -> Self {
        Self::Record { index, record }
    }

    /// Create a state message describing a snapshot
    pub fn state(snapshot: &Snapshot) -> Self {
        Self::State {
            data: json!({
                "phase": snapshot.phase,
                "records": snapshot.records.len(),
                "cursor": snapshot.cursor,
                "loading": snapshot.loading,
                "generation": snapshot.generation,
                "resets": snapshot.resets,
                "error": snapshot.error_banner,
                "empty": snapshot.empty_banner,
            }),
        }
    }

    /// Create a log message
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    /// Create an info log
    pub fn info(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Info, message)
    }

    /// Create a warning log
    pub fn warn(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Warn, message)
    }

    /// Create an error log
    pub fn error(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Error, message)
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// JSON wire form
    pub fn to_json(&self) -> Value {
        match self {
            Message::Record { index, record } => json!({
                "type": "RECORD",
                "record": {
                    "index": index,
                    "id": record.id,
                    "display_name": record.display_name,
                }
            }),
            Message::State { data } => json!({
                "type": "STATE",
                "state": data,
            }),
            Message::Log { level, message } => json!({
                "type": "LOG",
                "log": {
                    "level": level.as_str(),
                    "message": message,
                }
            }),
        }
    }

    /// Single-line human form
    pub fn to_pretty(&self) -> String {
        match self {
            Message::Record { index, record } => format!("{index:>5}  {record}"),
            Message::State { data } => {
                let mut line = format!("-- {}", data["phase"].as_str().unwrap_or("unknown"));
                line.push_str(&format!(", {} records", data["records"]));
                if let Some(error) = data["error"].as_object() {
                    line.push_str(&format!(
                        ", error: {}, retry in {}s",
                        error["description"].as_str().unwrap_or_default(),
                        error["remaining_seconds"]
                    ));
                }
                if let Some(empty) = data["empty"].as_object() {
                    line.push_str(&format!(", refresh in {}s", empty["remaining_seconds"]));
                }
                line
            }
            Message::Log { level, message } => format!("[{}] {message}", level.as_str()),
        }
    }
}
