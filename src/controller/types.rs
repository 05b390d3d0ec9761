//! Controller types

use crate::fetch::FetchResult;
use crate::store::StoreConfig;
use std::time::Duration;

/// Intent sent from the presentation layer to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// List became visible
    InitialLoad,
    /// User scrolled near the end of the list
    LoadMore,
    /// Row at this index is about to be displayed
    RowWillDisplay(usize),
    /// User pulled to refresh
    PullToRefresh,
    /// User tapped retry on the error surface
    Retry,
    /// User tapped refresh on the empty-state surface
    ManualRefresh,
    /// Stop the controller
    Shutdown,
}

/// Result of a spawned fetch, delivered back onto the controller task
#[derive(Debug)]
pub(crate) struct FetchDone {
    pub generation: u64,
    pub result: FetchResult,
}

/// Configuration for a list controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Timing policy of the store
    pub store: StoreConfig,
    /// Period of one countdown tick
    pub tick_period: Duration,
    /// Delay between a pull-to-refresh gesture and the reset
    pub pull_to_refresh_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            tick_period: Duration::from_secs(1),
            pull_to_refresh_delay: Duration::from_millis(300),
        }
    }
}

impl ControllerConfig {
    /// Create a controller config with default timings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store timing policy
    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Set the tick period
    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Set the pull-to-refresh delay
    #[must_use]
    pub fn with_pull_to_refresh_delay(mut self, delay: Duration) -> Self {
        self.pull_to_refresh_delay = delay;
        self
    }
}
