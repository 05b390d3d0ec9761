//! Paginated list store
//!
//! Single-owner state machine over the accumulated records. Intents and
//! fetch results go in, effects and snapshots come out; the store itself
//! performs no I/O and never retries on its own.

use super::timer::{RetryTimer, TimerTick};
use super::types::{
    Completion, Dispatch, EmptyBanner, Effect, ErrorBanner, ErrorInfo, FetchReason,
    FetchRequest, Ignored, ListPhase, MergeOutcome, Snapshot, StoreConfig,
};
use crate::fetch::{FetchError, FetchResult, Page};
use crate::types::{Cursor, Record, RecordId};
use std::collections::HashSet;
use tracing::{debug, info, trace, warn};

/// Internal phase; gated phases own their countdown
#[derive(Debug)]
enum Phase {
    Idle,
    Loading {
        generation: u64,
        reason: FetchReason,
    },
    Settled,
    Empty {
        timer: RetryTimer,
    },
    Error {
        timer: RetryTimer,
    },
}

impl Phase {
    fn kind(&self) -> ListPhase {
        match self {
            Phase::Idle => ListPhase::Idle,
            Phase::Loading { .. } => ListPhase::Loading,
            Phase::Settled => ListPhase::Settled,
            Phase::Empty { .. } => ListPhase::Empty,
            Phase::Error { .. } => ListPhase::Error,
        }
    }
}

/// Accumulated list with dedup, cursor tracking and gated retry
///
/// Invariants:
/// - every id in `seen_ids` belongs to exactly one entry of `records`
/// - at most one fetch is outstanding (the `Loading` phase)
/// - records are only dropped by [`reset`](Self::reset)
#[derive(Debug)]
pub struct PaginatedListStore {
    records: Vec<Record>,
    seen_ids: HashSet<RecordId>,
    cursor: Option<Cursor>,
    phase: Phase,
    last_error: Option<ErrorInfo>,
    generation: u64,
    resets: u64,
    consecutive_failures: u32,
    config: StoreConfig,
}

impl Default for PaginatedListStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginatedListStore {
    /// Create an idle store with the default timing policy
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an idle store
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            records: Vec::new(),
            seen_ids: HashSet::new(),
            cursor: None,
            phase: Phase::Idle,
            last_error: None,
            generation: 0,
            resets: 0,
            consecutive_failures: 0,
            config,
        }
    }

    // ========================================================================
    // Intents
    // ========================================================================

    /// Request the first page of a session
    pub fn initial_load(&mut self) -> Dispatch {
        match self.phase {
            Phase::Idle => {
                let request = self.begin_fetch(FetchReason::InitialLoad);
                Dispatch::Accepted(vec![Effect::Fetch(request)])
            }
            Phase::Loading { .. } => self.ignore("initial_load", Ignored::FetchInFlight),
            _ => self.ignore("initial_load", Ignored::NotIdle),
        }
    }

    /// Request the page after the current cursor
    pub fn load_more(&mut self) -> Dispatch {
        match self.phase {
            Phase::Settled if self.cursor.is_some() => {
                let request = self.begin_fetch(FetchReason::LoadMore);
                Dispatch::Accepted(vec![Effect::Fetch(request)])
            }
            Phase::Settled | Phase::Empty { .. } => {
                self.ignore("load_more", Ignored::CursorExhausted)
            }
            Phase::Loading { .. } => self.ignore("load_more", Ignored::FetchInFlight),
            ref other => {
                let kind = other.kind();
                self.ignore("load_more", Ignored::WrongPhase(kind))
            }
        }
    }

    /// Row `index` is about to be displayed
    ///
    /// Requests more only for the row at `records.len() - 1`.
    pub fn on_row_will_display(&mut self, index: usize) -> Dispatch {
        if self.records.len().checked_sub(1) != Some(index) {
            return Dispatch::Ignored(Ignored::NotAtTrigger);
        }
        self.load_more()
    }

    /// Re-issue the failed fetch once the retry gate has opened
    ///
    /// Uses the cursor held before the failing attempt.
    pub fn retry(&mut self) -> Dispatch {
        let remaining_seconds = match &self.phase {
            Phase::Error { timer } => timer.remaining_seconds(),
            Phase::Loading { .. } => return self.ignore("retry", Ignored::FetchInFlight),
            other => {
                let kind = other.kind();
                return self.ignore("retry", Ignored::WrongPhase(kind));
            }
        };
        if remaining_seconds > 0 {
            return self.ignore("retry", Ignored::GateClosed { remaining_seconds });
        }

        let request = self.begin_fetch(FetchReason::Retry);
        Dispatch::Accepted(vec![Effect::Fetch(request)])
    }

    /// Start over from the empty state once its gate has opened
    pub fn manual_refresh(&mut self) -> Dispatch {
        let remaining_seconds = match &self.phase {
            Phase::Empty { timer } => timer.remaining_seconds(),
            Phase::Loading { .. } => {
                return self.ignore("manual_refresh", Ignored::FetchInFlight)
            }
            other => {
                let kind = other.kind();
                return self.ignore("manual_refresh", Ignored::WrongPhase(kind));
            }
        };
        if remaining_seconds > 0 {
            return self.ignore("manual_refresh", Ignored::GateClosed { remaining_seconds });
        }

        self.reset()
    }

    /// Drop everything and load the first page again
    ///
    /// Abandons an outstanding fetch and cancels a running countdown. Always
    /// accepted.
    pub fn reset(&mut self) -> Dispatch {
        let mut effects = Vec::new();
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Loading { generation, .. } => {
                effects.push(Effect::CancelFetch { generation });
            }
            Phase::Empty { mut timer } | Phase::Error { mut timer } => {
                if timer.cancel() {
                    effects.push(Effect::StopTicker);
                }
            }
            Phase::Idle | Phase::Settled => {}
        }

        info!(
            "Resetting list, dropping {} records",
            self.records.len()
        );
        self.records.clear();
        self.seen_ids.clear();
        self.cursor = None;
        self.last_error = None;
        self.consecutive_failures = 0;
        self.resets += 1;

        effects.extend(self.initial_load().into_effects());
        Dispatch::Accepted(effects)
    }

    // ========================================================================
    // Driver callbacks
    // ========================================================================

    /// Report the result of the fetch issued under `generation`
    ///
    /// Results of abandoned fetches are dropped.
    ///
    /// # Panics
    ///
    /// Panics if `generation` was never issued by this store.
    pub fn complete(&mut self, generation: u64, result: FetchResult) -> Completion {
        assert!(
            generation != 0 && generation <= self.generation,
            "fetch result for generation {generation} that was never issued (latest {})",
            self.generation
        );

        let reason = match self.phase {
            Phase::Loading {
                generation: current,
                reason,
            } if current == generation => reason,
            _ => {
                debug!(
                    "Dropping stale fetch result for generation {} (latest {})",
                    generation, self.generation
                );
                return Completion::Stale { generation };
            }
        };

        match result {
            Ok(page) => self.apply_page(page, reason),
            Err(err) => self.apply_failure(err, reason),
        }
    }

    /// Advance the active countdown by one tick
    ///
    /// Asks for the ticker to stop once nothing is counting.
    pub fn tick(&mut self) -> Vec<Effect> {
        let timer = match &mut self.phase {
            Phase::Empty { timer } | Phase::Error { timer } => timer,
            _ => return vec![Effect::StopTicker],
        };

        match timer.tick() {
            TimerTick::Counting(remaining) => {
                trace!("Countdown at {}s", remaining);
                Vec::new()
            }
            TimerTick::Expired => {
                debug!("Countdown finished, {:?} action unlocked", self.phase.kind());
                vec![Effect::StopTicker]
            }
            TimerTick::Inactive => vec![Effect::StopTicker],
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current phase
    pub fn phase(&self) -> ListPhase {
        self.phase.kind()
    }

    /// Accumulated records in insertion order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Ids of all accumulated records
    pub fn seen_ids(&self) -> &HashSet<RecordId> {
        &self.seen_ids
    }

    /// Continuation cursor
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// Check if a fetch is in flight
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    /// Most recent failure
    pub fn last_error(&self) -> Option<&ErrorInfo> {
        self.last_error.as_ref()
    }

    /// Generation of the most recently issued fetch
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of times the list was reset
    pub fn resets(&self) -> u64 {
        self.resets
    }

    /// Countdown of the Error or Empty phase
    pub fn gate(&self) -> Option<&RetryTimer> {
        match &self.phase {
            Phase::Empty { timer } | Phase::Error { timer } => Some(timer),
            _ => None,
        }
    }

    /// Timing policy
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Build the view published to the presentation layer
    pub fn snapshot(&self) -> Snapshot {
        let error_banner = match &self.phase {
            Phase::Error { timer } => Some(ErrorBanner {
                description: self
                    .last_error
                    .as_ref()
                    .map(|e| e.description.clone())
                    .unwrap_or_default(),
                retry_enabled: timer.is_expired(),
                remaining_seconds: timer.remaining_seconds(),
            }),
            _ => None,
        };
        let empty_banner = match &self.phase {
            Phase::Empty { timer } => Some(EmptyBanner {
                refresh_enabled: timer.is_expired(),
                remaining_seconds: timer.remaining_seconds(),
            }),
            _ => None,
        };

        Snapshot {
            phase: self.phase(),
            records: self.records.clone(),
            cursor: self.cursor.clone(),
            loading: self.is_loading(),
            last_error: self.last_error.clone(),
            generation: self.generation,
            resets: self.resets,
            error_banner,
            empty_banner,
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn begin_fetch(&mut self, reason: FetchReason) -> FetchRequest {
        self.generation += 1;
        self.phase = Phase::Loading {
            generation: self.generation,
            reason,
        };
        debug!(
            "Issuing {:?} fetch, generation {}, cursor {:?}",
            reason,
            self.generation,
            self.cursor.as_ref().map(Cursor::as_str)
        );

        FetchRequest {
            generation: self.generation,
            cursor: self.cursor.clone(),
            reason,
        }
    }

    fn apply_page(&mut self, page: Page, reason: FetchReason) -> Completion {
        let outcome = self.merge(page.records);
        self.cursor = page.next_cursor;
        self.last_error = None;
        self.consecutive_failures = 0;

        let mut effects = Vec::new();
        if self.records.is_empty() && self.cursor.is_none() {
            let timer = RetryTimer::started(self.config.empty_refresh_delay_secs);
            if timer.is_active() {
                effects.push(Effect::StartTicker);
            }
            self.phase = Phase::Empty { timer };
        } else {
            self.phase = Phase::Settled;
        }

        info!(
            "{:?} fetch merged: {} appended, {} duplicates, {} total, more pages: {}",
            reason,
            outcome.appended,
            outcome.discarded,
            self.records.len(),
            self.cursor.is_some()
        );

        Completion::Merged {
            outcome,
            phase: self.phase(),
            effects,
        }
    }

    fn apply_failure(&mut self, err: FetchError, reason: FetchReason) -> Completion {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let delay = self.config.retry_delay(self.consecutive_failures);
        warn!(
            "{:?} fetch failed ({} in a row): {}; retry unlocks in {}s",
            reason, self.consecutive_failures, err, delay
        );

        self.last_error = Some(ErrorInfo {
            description: err.description,
            consecutive_failures: self.consecutive_failures,
        });

        let timer = RetryTimer::started(delay);
        let effects = if timer.is_active() {
            vec![Effect::StartTicker]
        } else {
            Vec::new()
        };
        self.phase = Phase::Error { timer };

        Completion::Failed { effects }
    }

    fn merge(&mut self, incoming: Vec<Record>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for record in incoming {
            if self.seen_ids.insert(record.id) {
                self.records.push(record);
                outcome.appended += 1;
            } else {
                outcome.discarded += 1;
            }
        }

        debug_assert_eq!(self.seen_ids.len(), self.records.len());
        outcome
    }

    fn ignore(&self, intent: &str, reason: Ignored) -> Dispatch {
        debug!("Ignoring {} in {:?}: {:?}", intent, self.phase(), reason);
        Dispatch::Ignored(reason)
    }
}
