//! Scripted page fetcher
//!
//! Replays a queue of prepared responses in order and records every cursor
//! it was asked for. Handy for tests and for replaying a captured session.

use super::types::{FetchError, FetchResult, Page, PageFetcher};
use crate::types::Cursor;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Fetcher that plays back a fixed script
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<FetchResult>>,
    calls: Mutex<Vec<Option<Cursor>>>,
    delay: Duration,
}

impl ScriptedFetcher {
    /// Create an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue a successful page
    #[must_use]
    pub fn page(self, page: Page) -> Self {
        self.push(Ok(page));
        self
    }

    /// Queue a failure
    #[must_use]
    pub fn error(self, description: impl Into<String>) -> Self {
        self.push(Err(FetchError::new(description)));
        self
    }

    /// Append a response to the script
    pub fn push(&self, result: FetchResult) {
        lock(&self.script).push_back(result);
    }

    /// Cursors passed to `fetch`, in call order
    pub fn calls(&self) -> Vec<Option<Cursor>> {
        lock(&self.calls).clone()
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Responses not yet consumed
    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, cursor: Option<Cursor>) -> FetchResult {
        lock(&self.calls).push(cursor);
        let next = lock(&self.script).pop_front();

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        next.unwrap_or_else(|| Err(FetchError::new("script exhausted")))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
