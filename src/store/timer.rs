//! Countdown gate for retry and refresh actions
//!
//! A `RetryTimer` counts whole ticks down to zero. While it is counting the
//! action it guards stays locked; at zero it unlocks and deactivates itself.
//! Starting a running timer cancels the old countdown first, and cancelling
//! an inactive timer does nothing, so a single timer can never be driven by
//! two countdowns.

use serde::Serialize;
use tracing::trace;

/// Result of advancing a timer by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Timer was not running, nothing changed
    Inactive,
    /// Still counting, this many ticks left
    Counting(u32),
    /// Reached zero on this tick
    Expired,
}

/// Owned, cancel-safe countdown
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RetryTimer {
    remaining_seconds: u32,
    active: bool,
}

impl RetryTimer {
    /// Create a timer that is already counting down from `seconds`
    ///
    /// A zero-second timer starts out expired.
    pub fn started(seconds: u32) -> Self {
        let mut timer = Self::default();
        timer.start(seconds);
        timer
    }

    /// Begin a fresh countdown
    ///
    /// Returns `true` if a running countdown had to be cancelled first.
    pub fn start(&mut self, seconds: u32) -> bool {
        let replaced = self.cancel();
        self.remaining_seconds = seconds;
        self.active = seconds > 0;
        trace!("Retry timer started at {}s", seconds);
        replaced
    }

    /// Advance by one tick
    pub fn tick(&mut self) -> TimerTick {
        if !self.active {
            return TimerTick::Inactive;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.active = false;
            TimerTick::Expired
        } else {
            TimerTick::Counting(self.remaining_seconds)
        }
    }

    /// Stop counting
    ///
    /// Returns `true` if the timer was running. Cancelling twice is a no-op.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.active;
        self.active = false;
        was_active
    }

    /// Ticks left before the action unlocks
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Check if the countdown is running
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Check if the guarded action is unlocked
    pub fn is_expired(&self) -> bool {
        self.remaining_seconds == 0
    }
}
