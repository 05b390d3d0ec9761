//! Fetcher types and traits
//!
//! Defines the remote-call contract consumed by the list store.

use crate::error::Error;
use crate::types::{Cursor, Record};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// One batch of records returned by the source
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    /// Records in source order
    pub records: Vec<Record>,
    /// Continuation token, `None` when this was the last page
    pub next_cursor: Option<Cursor>,
}

impl Page {
    /// Create a page followed by more pages
    pub fn new(records: Vec<Record>, next_cursor: impl Into<Cursor>) -> Self {
        Self {
            records,
            next_cursor: Some(next_cursor.into()),
        }
    }

    /// Create the final page
    pub fn last(records: Vec<Record>) -> Self {
        Self {
            records,
            next_cursor: None,
        }
    }

    /// Check if the source has nothing after this page
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// Failure reported by a fetcher
///
/// Always recoverable; the description is shown to the user verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{description}")]
pub struct FetchError {
    /// Human-readable description
    pub description: String,
}

impl FetchError {
    /// Create a fetch error
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl From<Error> for FetchError {
    fn from(err: Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Result of a single fetch
pub type FetchResult = std::result::Result<Page, FetchError>;

/// Remote-call contract
///
/// `None` asks for the first page. Implementations hold no pagination state
/// and never retry; the caller guarantees at most one outstanding call and
/// may abandon a call by dropping its future.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page that starts at `cursor`
    async fn fetch(&self, cursor: Option<Cursor>) -> FetchResult;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch(&self, cursor: Option<Cursor>) -> FetchResult {
        (**self).fetch(cursor).await
    }
}
