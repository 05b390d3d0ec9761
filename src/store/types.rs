//! Store types
//!
//! Phases, effects, intent outcomes and the snapshot published to the
//! presentation layer.

use crate::types::{BackoffType, Cursor, Record};
use serde::Serialize;

/// Externally visible phase of the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListPhase {
    /// Nothing requested yet
    Idle,
    /// A fetch is in flight
    Loading,
    /// Records present, no fetch pending
    Settled,
    /// Zero records and nothing more to load
    Empty,
    /// Last fetch failed
    Error,
}

/// Last fetch failure as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    /// Description reported by the fetcher
    pub description: String,
    /// Failures in a row, including this one
    pub consecutive_failures: u32,
}

/// Result of merging one page into the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MergeOutcome {
    /// Records appended to the list
    pub appended: usize,
    /// Records dropped because their id was already present
    pub discarded: usize,
}

/// Why a fetch was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchReason {
    /// First page of a session
    InitialLoad,
    /// Next page after scrolling near the end
    LoadMore,
    /// Same page again after a failure
    Retry,
}

/// A fetch the driver must perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Generation the result must be reported under
    pub generation: u64,
    /// Cursor to pass to the fetcher
    pub cursor: Option<Cursor>,
    /// What triggered the fetch
    pub reason: FetchReason,
}

/// Side effect requested by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start a fetch and report its result under the request's generation
    Fetch(FetchRequest),
    /// Abandon the fetch issued under this generation
    CancelFetch {
        /// Generation of the abandoned fetch
        generation: u64,
    },
    /// Begin delivering one tick per period
    StartTicker,
    /// Stop delivering ticks
    StopTicker,
}

/// Why an intent was not honored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    /// A fetch is already in flight
    FetchInFlight,
    /// Initial load was already performed for this session
    NotIdle,
    /// The source reported no further pages
    CursorExhausted,
    /// Intent does not apply in this phase
    WrongPhase(ListPhase),
    /// Countdown has not reached zero
    GateClosed {
        /// Ticks left
        remaining_seconds: u32,
    },
    /// The displayed row is not the load-more trigger row
    NotAtTrigger,
}

/// Outcome of an intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// State changed; perform these effects
    Accepted(Vec<Effect>),
    /// State unchanged
    Ignored(Ignored),
}

impl Dispatch {
    /// Check if the intent was honored
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// Reason the intent was dropped, if it was
    pub fn ignored(&self) -> Option<Ignored> {
        match self {
            Self::Ignored(reason) => Some(*reason),
            Self::Accepted(_) => None,
        }
    }

    /// Effects to perform (empty when ignored)
    pub fn into_effects(self) -> Vec<Effect> {
        match self {
            Self::Accepted(effects) => effects,
            Self::Ignored(_) => Vec::new(),
        }
    }
}

/// Outcome of reporting a fetch result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Page merged into the list
    Merged {
        /// What the merge did
        outcome: MergeOutcome,
        /// Phase after the merge
        phase: ListPhase,
        /// Effects to perform
        effects: Vec<Effect>,
    },
    /// Failure recorded, retry gate armed
    Failed {
        /// Effects to perform
        effects: Vec<Effect>,
    },
    /// Result belonged to an abandoned fetch and was dropped
    Stale {
        /// Generation of the dropped result
        generation: u64,
    },
}

impl Completion {
    /// Effects to perform
    pub fn into_effects(self) -> Vec<Effect> {
        match self {
            Self::Merged { effects, .. } | Self::Failed { effects } => effects,
            Self::Stale { .. } => Vec::new(),
        }
    }
}

/// Error surface shown while in the Error phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBanner {
    /// Description of the failure
    pub description: String,
    /// Retry action unlocked
    pub retry_enabled: bool,
    /// Ticks until retry unlocks
    pub remaining_seconds: u32,
}

/// Empty-state surface shown while in the Empty phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyBanner {
    /// Manual refresh unlocked
    pub refresh_enabled: bool,
    /// Ticks until refresh unlocks
    pub remaining_seconds: u32,
}

/// Read-only view of the list after a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Current phase
    pub phase: ListPhase,
    /// Records to render, in insertion order
    pub records: Vec<Record>,
    /// Continuation cursor
    pub cursor: Option<Cursor>,
    /// Spinner on/off
    pub loading: bool,
    /// Most recent failure, cleared by success or reset
    pub last_error: Option<ErrorInfo>,
    /// Generation of the most recently issued fetch
    pub generation: u64,
    /// Number of resets so far; a change means `records` started over
    pub resets: u64,
    /// Present only in the Error phase
    pub error_banner: Option<ErrorBanner>,
    /// Present only in the Empty phase
    pub empty_banner: Option<EmptyBanner>,
}

impl Snapshot {
    /// Check if displaying row `index` should request the next page
    ///
    /// True for the row at `records.len() - 1` while not loading and a
    /// cursor is present.
    pub fn is_load_more_trigger(&self, index: usize) -> bool {
        !self.loading
            && self.cursor.is_some()
            && self.records.len().checked_sub(1) == Some(index)
    }

    /// Check if more pages may be requested
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }
}

/// Timing policy of the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Countdown after a failed fetch
    pub error_retry_delay_secs: u32,
    /// Countdown on the empty-state refresh
    pub empty_refresh_delay_secs: u32,
    /// Growth of the retry countdown across consecutive failures
    pub backoff: BackoffType,
    /// Upper bound for the retry countdown
    pub max_retry_delay_secs: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            error_retry_delay_secs: 5,
            empty_refresh_delay_secs: 3,
            backoff: BackoffType::Constant,
            max_retry_delay_secs: 60,
        }
    }
}

impl StoreConfig {
    /// Retry countdown after the given number of consecutive failures
    pub fn retry_delay(&self, consecutive_failures: u32) -> u32 {
        let base = self.error_retry_delay_secs;
        let failures = consecutive_failures.max(1);
        let delay = match self.backoff {
            BackoffType::Constant => base,
            BackoffType::Linear => base.saturating_mul(failures),
            BackoffType::Exponential => {
                base.saturating_mul(2u32.saturating_pow(failures - 1))
            }
        };

        std::cmp::min(delay, self.max_retry_delay_secs)
    }
}
