//! Page fetcher module
//!
//! Supports: HTTP JSON endpoints, a simulated flaky directory, scripted replay
//!
//! # Overview
//!
//! A [`PageFetcher`] turns an opaque cursor into a [`Page`] of records and
//! the cursor of the page after it. Fetchers keep no pagination state and
//! never retry; the list store decides when and with which cursor to call.

mod http;
mod scripted;
mod simulated;
mod types;

pub use http::{HttpFetcherConfig, HttpPageFetcher};
pub use scripted::ScriptedFetcher;
pub use simulated::{SimulatedConfig, SimulatedSource};
pub use types::{FetchError, FetchResult, Page, PageFetcher};
