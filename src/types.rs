//! Common types used throughout pagefeed
//!
//! This module contains the record and cursor types shared by the fetchers,
//! the list store and the presentation layer, plus a few small utilities.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Record
// ============================================================================

/// Identity key of a record
pub type RecordId = i64;

/// A single list entry
///
/// Records are immutable once created. `id` is the identity used for dedup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Unique identity key
    pub id: RecordId,
    /// Name shown in the list
    #[serde(alias = "fullName", alias = "full_name", alias = "name")]
    pub display_name: String,
}

impl Record {
    /// Create a new record
    pub fn new(id: RecordId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.id)
    }
}

// ============================================================================
// Cursor
// ============================================================================

/// Opaque continuation token returned by the remote source
///
/// Never inspected or parsed by the list store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token as sent back to the source
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build a cursor from a wire value, treating an empty token as "no more pages"
    pub fn from_wire(token: Option<String>) -> Option<Self> {
        token.none_if_empty().map(Self)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cursor {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for Cursor {
    fn from(token: String) -> Self {
        Self(token)
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// How the retry countdown grows across consecutive failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Same countdown after every failure
    #[default]
    Constant,
    /// Countdown grows linearly with the failure count
    Linear,
    /// Countdown doubles with every failure
    Exponential,
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_display() {
        let record = Record::new(7, "Ada Lovelace");
        assert_eq!(record.to_string(), "Ada Lovelace (7)");
    }

    #[test]
    fn test_record_wire_aliases() {
        let record: Record = serde_json::from_str(r#"{"id": 1, "fullName": "Alice"}"#).unwrap();
        assert_eq!(record, Record::new(1, "Alice"));

        let record: Record = serde_json::from_str(r#"{"id": 2, "name": "Bob"}"#).unwrap();
        assert_eq!(record.display_name, "Bob");

        let record: Record =
            serde_json::from_str(r#"{"id": 3, "display_name": "Carol"}"#).unwrap();
        assert_eq!(record.display_name, "Carol");
    }

    #[test]
    fn test_cursor_from_wire() {
        assert_eq!(
            Cursor::from_wire(Some("c1".to_string())),
            Some(Cursor::new("c1"))
        );
        assert_eq!(Cursor::from_wire(Some(String::new())), None);
        assert_eq!(Cursor::from_wire(None), None);
    }

    #[test]
    fn test_cursor_serde_transparent() {
        let cursor: Cursor = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(cursor.as_str(), "abc");
        assert_eq!(serde_json::to_string(&cursor).unwrap(), "\"abc\"");
    }

    #[test]
    fn test_backoff_type_serde() {
        let backoff: BackoffType = serde_json::from_str("\"exponential\"").unwrap();
        assert_eq!(backoff, BackoffType::Exponential);
        assert_eq!(BackoffType::default(), BackoffType::Constant);
    }

    #[test]
    fn test_option_string_none_if_empty() {
        assert_eq!(
            Some("test".to_string()).none_if_empty(),
            Some("test".to_string())
        );
        assert_eq!(Some(String::new()).none_if_empty(), None);
        assert_eq!(None::<String>.none_if_empty(), None);
    }
}
