//! List controller module
//!
//! Async driver around [`PaginatedListStore`].
//!
//! # Overview
//!
//! The controller module provides:
//! - `ListController` - owns the store and runs it on a single tokio task
//! - `ListHandle` - cloneable presentation-facing surface (intents in, snapshots out)
//! - `ControllerConfig` - tick period, pull-to-refresh delay and store timings
//!
//! Every store transition happens on the controller task. Fetches run on
//! their own abortable tasks and report back through a channel; the
//! countdown ticker only exists while the store asks for it.

mod types;

pub use types::{ControllerConfig, Intent};

use crate::error::{Error, Result};
use crate::fetch::PageFetcher;
use crate::store::{Effect, FetchRequest, PaginatedListStore, Snapshot};
use futures::future::{AbortHandle, Abortable};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, trace};
use types::FetchDone;

/// Fetch currently running on its own task
struct InFlight {
    generation: u64,
    abort: AbortHandle,
}

/// Drives a [`PaginatedListStore`] from presentation intents
pub struct ListController {
    store: PaginatedListStore,
    fetcher: Arc<dyn PageFetcher>,
    tick_period: Duration,
    pull_to_refresh_delay: Duration,
    intents: mpsc::UnboundedReceiver<Intent>,
    completions_tx: mpsc::UnboundedSender<FetchDone>,
    completions: mpsc::UnboundedReceiver<FetchDone>,
    snapshots: watch::Sender<Snapshot>,
    in_flight: Option<InFlight>,
    ticker: Option<Interval>,
    refresh_deadline: Option<Instant>,
}

impl ListController {
    /// Create a controller and the handle that talks to it
    ///
    /// Nothing happens until [`run`](Self::run) is awaited.
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: ControllerConfig) -> (Self, ListHandle) {
        let store = PaginatedListStore::with_config(config.store);
        let (intents_tx, intents) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (snapshots, snapshots_rx) = watch::channel(store.snapshot());

        let controller = Self {
            store,
            fetcher,
            tick_period: config.tick_period.max(Duration::from_millis(1)),
            pull_to_refresh_delay: config.pull_to_refresh_delay,
            intents,
            completions_tx,
            completions,
            snapshots,
            in_flight: None,
            ticker: None,
            refresh_deadline: None,
        };
        let handle = ListHandle {
            intents: intents_tx,
            snapshots: snapshots_rx,
        };

        (controller, handle)
    }

    /// Create a controller and run it on a new task
    pub fn spawn(
        fetcher: Arc<dyn PageFetcher>,
        config: ControllerConfig,
    ) -> (ListHandle, JoinHandle<()>) {
        let (controller, handle) = Self::new(fetcher, config);
        let task = tokio::spawn(controller.run());
        (handle, task)
    }

    /// Process intents until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        info!("List controller started");

        loop {
            tokio::select! {
                intent = self.intents.recv() => match intent {
                    Some(Intent::Shutdown) | None => break,
                    Some(intent) => self.handle_intent(intent),
                },
                Some(done) = self.completions.recv() => self.handle_completion(done),
                () = next_tick(&mut self.ticker) => {
                    let effects = self.store.tick();
                    self.apply(effects);
                }
                () = deadline(self.refresh_deadline) => {
                    self.refresh_deadline = None;
                    let effects = self.store.reset().into_effects();
                    self.apply(effects);
                }
            }

            self.publish();
        }

        if let Some(in_flight) = self.in_flight.take() {
            in_flight.abort.abort();
        }
        info!("List controller stopped");
    }

    fn handle_intent(&mut self, intent: Intent) {
        trace!("Intent received: {:?}", intent);
        let dispatch = match intent {
            Intent::InitialLoad => self.store.initial_load(),
            Intent::LoadMore => self.store.load_more(),
            Intent::RowWillDisplay(index) => self.store.on_row_will_display(index),
            Intent::Retry => self.store.retry(),
            Intent::ManualRefresh => self.store.manual_refresh(),
            Intent::PullToRefresh => {
                // A second pull inside the delay moves the deadline
                self.refresh_deadline = Some(Instant::now() + self.pull_to_refresh_delay);
                return;
            }
            Intent::Shutdown => return,
        };

        self.apply(dispatch.into_effects());
    }

    fn handle_completion(&mut self, done: FetchDone) {
        if self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.generation == done.generation)
        {
            self.in_flight = None;
        }

        let effects = self
            .store
            .complete(done.generation, done.result)
            .into_effects();
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            debug!("Applying effect {:?}", effect);
            match effect {
                Effect::Fetch(request) => self.spawn_fetch(request),
                Effect::CancelFetch { generation } => self.cancel_fetch(generation),
                Effect::StartTicker => {
                    let mut ticker =
                        tokio::time::interval_at(Instant::now() + self.tick_period, self.tick_period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    self.ticker = Some(ticker);
                }
                Effect::StopTicker => self.ticker = None,
            }
        }
    }

    fn spawn_fetch(&mut self, request: FetchRequest) {
        let (abort, registration) = AbortHandle::new_pair();
        let fetcher = Arc::clone(&self.fetcher);
        let completions = self.completions_tx.clone();
        let generation = request.generation;

        tokio::spawn(async move {
            let fetch = Abortable::new(fetcher.fetch(request.cursor), registration);
            if let Ok(result) = fetch.await {
                // Receiver gone means the controller has stopped
                let _ = completions.send(FetchDone { generation, result });
            }
        });

        if let Some(previous) = self.in_flight.replace(InFlight { generation, abort }) {
            previous.abort.abort();
        }
    }

    fn cancel_fetch(&mut self, generation: u64) {
        match self.in_flight.take() {
            Some(in_flight) if in_flight.generation == generation => {
                debug!("Aborting fetch for generation {}", generation);
                in_flight.abort.abort();
            }
            other => self.in_flight = other,
        }
    }

    fn publish(&self) {
        let snapshot = self.store.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn deadline(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Presentation-facing surface of a running [`ListController`]
///
/// Cloning is cheap. The controller stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct ListHandle {
    intents: mpsc::UnboundedSender<Intent>,
    snapshots: watch::Receiver<Snapshot>,
}

impl ListHandle {
    /// List became visible; loads the first page once per session
    pub fn on_appear_request_initial_load(&self) -> Result<()> {
        self.send(Intent::InitialLoad)
    }

    /// User scrolled near the end of the list
    pub fn on_near_end_of_list_request_more(&self) -> Result<()> {
        self.send(Intent::LoadMore)
    }

    /// Row at `index` is about to be displayed
    pub fn on_row_will_display(&self, index: usize) -> Result<()> {
        self.send(Intent::RowWillDisplay(index))
    }

    /// User pulled to refresh; resets the list after a short delay
    pub fn on_pull_to_refresh(&self) -> Result<()> {
        self.send(Intent::PullToRefresh)
    }

    /// User tapped retry on the error surface
    pub fn on_user_tap_retry(&self) -> Result<()> {
        self.send(Intent::Retry)
    }

    /// User tapped refresh on the empty-state surface
    pub fn on_user_tap_manual_refresh_from_empty_state(&self) -> Result<()> {
        self.send(Intent::ManualRefresh)
    }

    /// Stop the controller and abort any fetch in flight
    pub fn shutdown(&self) -> Result<()> {
        self.send(Intent::Shutdown)
    }

    /// Send a raw intent
    pub fn send(&self, intent: Intent) -> Result<()> {
        self.intents
            .send(intent)
            .map_err(|_| Error::ControllerClosed)
    }

    /// Receiver notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait until a published snapshot satisfies `predicate`
    ///
    /// Checks the current snapshot first.
    pub async fn wait_for(&self, mut predicate: impl FnMut(&Snapshot) -> bool) -> Result<Snapshot> {
        let mut rx = self.subscribe();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| Error::ControllerClosed)?;
        Ok(snapshot.clone())
    }
}

#[cfg(test)]
mod tests;
