//! List store module
//!
//! Owns the accumulated records, the dedup set, the continuation cursor and
//! the retry/refresh countdowns.
//!
//! # Overview
//!
//! The store module provides:
//! - `PaginatedListStore` - the fetch/merge/retry state machine
//! - `RetryTimer` - cancel-safe countdown owned by the Error and Empty phases
//! - `Snapshot` - what the presentation layer renders after each transition
//!
//! ```text
//! Idle     --initial_load-------------------> Loading
//! Settled  --load_more (cursor present)-----> Loading
//! Loading  --page merged, otherwise---------> Settled
//! Loading  --page merged, empty, no cursor--> Empty   (refresh gate armed)
//! Loading  --fetch failed-------------------> Error   (retry gate armed)
//! Error    --retry (gate open)--------------> Loading (same cursor)
//! Empty    --manual_refresh (gate open)-----> reset
//! any      --reset--------------------------> Idle --> Loading
//! ```

mod list;
mod timer;
mod types;

pub use list::PaginatedListStore;
pub use timer::{RetryTimer, TimerTick};
pub use types::{
    Completion, Dispatch, EmptyBanner, Effect, ErrorBanner, ErrorInfo, FetchReason, FetchRequest,
    Ignored, ListPhase, MergeOutcome, Snapshot, StoreConfig,
};
