//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::cli::messages::Message;
use crate::config::FeedConfig;
use crate::controller::{Intent, ListController, ListHandle};
use crate::error::{Error, Result};
use crate::store::{ListPhase, Snapshot};
use crate::types::Record;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Limits for [`drain`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainOptions {
    /// Stop once this many records are loaded
    pub max_records: Option<usize>,
    /// Give up once this many fetches in a row have failed
    pub max_failures: u32,
}

impl Default for DrainOptions {
    fn default() -> Self {
        Self {
            max_records: None,
            max_failures: 3,
        }
    }
}

/// What a drain loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainSummary {
    /// Records in list order
    pub records: Vec<Record>,
    /// Failed fetches over the whole run
    pub failures: u32,
}

/// Load pages through a running controller until the source is exhausted
///
/// Scrolls to the end after every page and, on failure, waits for the retry
/// countdown before tapping retry. Every transition and every new record is
/// passed to `emit`.
pub async fn drain(
    handle: &ListHandle,
    options: DrainOptions,
    mut emit: impl FnMut(Message),
) -> Result<DrainSummary> {
    let limit = options.max_records.unwrap_or(usize::MAX);
    let mut emitted = 0;
    let mut failures_in_row = 0;
    let mut failures = 0;

    handle.on_appear_request_initial_load()?;
    let mut snapshot = handle.wait_for(|s| s.generation > 0 && !s.loading).await?;

    loop {
        emit(Message::state(&snapshot));
        let generation = snapshot.generation;

        match snapshot.phase {
            ListPhase::Settled => {
                failures_in_row = 0;
                emitted = emit_new_records(&snapshot, emitted, limit, &mut emit);
                if emitted >= limit || !snapshot.has_more() {
                    break;
                }
                handle.on_near_end_of_list_request_more()?;
            }
            ListPhase::Error => {
                failures_in_row += 1;
                failures += 1;
                let description = snapshot
                    .last_error
                    .as_ref()
                    .map(|e| e.description.clone())
                    .unwrap_or_default();

                if failures_in_row >= options.max_failures {
                    emit(Message::error(format!(
                        "Giving up after {failures_in_row} failed fetches: {description}"
                    )));
                    return Err(Error::Other(format!(
                        "Source kept failing: {description}"
                    )));
                }

                emit(Message::warn(format!(
                    "Fetch failed: {description}; waiting for retry"
                )));
                handle
                    .wait_for(|s| s.error_banner.as_ref().map_or(true, |b| b.retry_enabled))
                    .await?;
                handle.on_user_tap_retry()?;
            }
            ListPhase::Empty => {
                emit(Message::info("Source has no records"));
                break;
            }
            // Excluded by the wait predicates
            ListPhase::Idle | ListPhase::Loading => {}
        }

        snapshot = handle
            .wait_for(|s| s.generation > generation && !s.loading)
            .await?;
    }

    let mut records = snapshot.records;
    records.truncate(limit);
    emit(Message::info(format!(
        "Loaded {} records, {} failed fetches",
        records.len(),
        failures
    )));

    Ok(DrainSummary { records, failures })
}

fn emit_new_records(
    snapshot: &Snapshot,
    emitted: usize,
    limit: usize,
    emit: &mut impl FnMut(Message),
) -> usize {
    let end = snapshot.records.len().min(limit);
    for (index, record) in snapshot.records.iter().enumerate().take(end).skip(emitted) {
        emit(Message::record(index, record.clone()));
    }
    end.max(emitted)
}

/// How far a browse session has printed the list
#[derive(Debug, Default)]
struct BrowseProgress {
    resets: u64,
    emitted: usize,
}

impl BrowseProgress {
    /// Print records not shown yet, numbering from zero again after a reset
    fn advance(&mut self, snapshot: &Snapshot, emit: &mut impl FnMut(Message)) {
        if snapshot.resets != self.resets {
            self.resets = snapshot.resets;
            self.emitted = 0;
        }
        self.emitted = emit_new_records(snapshot, self.emitted, usize::MAX, emit);
    }
}

/// A line typed into `browse`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    /// Forward an intent to the controller
    Send(Intent),
    /// Print every record
    Show,
    /// Leave browse
    Quit,
    /// Nothing typed
    Blank,
    /// Unrecognized input
    Unknown(String),
}

impl BrowseCommand {
    /// Parse one input line
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Self::Blank;
        };

        match word.to_ascii_lowercase().as_str() {
            "more" | "m" => Self::Send(Intent::LoadMore),
            "row" => match words.next().and_then(|n| n.parse().ok()) {
                Some(index) => Self::Send(Intent::RowWillDisplay(index)),
                None => Self::Unknown(line.trim().to_string()),
            },
            "retry" | "r" => Self::Send(Intent::Retry),
            "refresh" => Self::Send(Intent::ManualRefresh),
            "pull" | "p" => Self::Send(Intent::PullToRefresh),
            "show" | "s" => Self::Show,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(line.trim().to_string()),
        }
    }
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Drain {
                max_records,
                max_failures,
            } => {
                let options = DrainOptions {
                    max_records: *max_records,
                    max_failures: *max_failures,
                };
                self.drain(options).await
            }
            Commands::Browse => self.browse().await,
            Commands::Config => self.show_config(),
        }
    }

    /// Load configuration, falling back to defaults
    fn load_config(&self) -> Result<FeedConfig> {
        match &self.cli.config {
            Some(path) => FeedConfig::load(path),
            None => Ok(FeedConfig::default()),
        }
    }

    /// Build the fetcher and spawn a controller over it
    fn start(&self) -> Result<(ListHandle, JoinHandle<()>)> {
        let config = self.load_config()?;
        let fetcher = config.source.build_fetcher()?;
        info!("Starting list over {} source", config.source.kind());
        Ok(ListController::spawn(fetcher, config.controller_config()))
    }

    async fn stop(handle: ListHandle, task: JoinHandle<()>) -> Result<()> {
        // Already stopped is fine
        let _ = handle.shutdown();
        drop(handle);
        task.await
            .map_err(|e| Error::Other(format!("List controller task failed: {e}")))
    }

    /// Load everything
    async fn drain(&self, options: DrainOptions) -> Result<()> {
        let (handle, task) = self.start()?;
        let result = drain(&handle, options, |msg| self.output(&msg)).await;
        Self::stop(handle, task).await?;

        let summary = result?;
        debug!("Drain finished with {} records", summary.records.len());
        Ok(())
    }

    /// Interactive session over stdin
    async fn browse(&self) -> Result<()> {
        let (handle, task) = self.start()?;
        let mut snapshots = handle.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut progress = BrowseProgress::default();

        self.output(&Message::info(
            "Commands: more, row <index>, retry, refresh, pull, show, quit",
        ));
        handle.on_appear_request_initial_load()?;

        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    progress.advance(&snapshot, &mut |msg| self.output(&msg));
                    self.output(&Message::state(&snapshot));
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match BrowseCommand::parse(&line) {
                        BrowseCommand::Send(intent) => handle.send(intent)?,
                        BrowseCommand::Show => {
                            for (index, record) in handle.snapshot().records.into_iter().enumerate() {
                                self.output(&Message::record(index, record));
                            }
                        }
                        BrowseCommand::Quit => break,
                        BrowseCommand::Blank => {}
                        BrowseCommand::Unknown(input) => {
                            self.output(&Message::warn(format!("Unknown command: {input}")));
                        }
                    }
                }
            }
        }

        Self::stop(handle, task).await
    }

    /// Print the effective configuration
    fn show_config(&self) -> Result<()> {
        let config = self.load_config()?;
        match self.cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
            OutputFormat::Pretty => print!("{}", serde_yaml::to_string(&config)?),
        }
        Ok(())
    }

    /// Output a message
    fn output(&self, msg: &Message) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(&msg.to_json()).unwrap_or_default());
            }
            OutputFormat::Pretty => println!("{}", msg.to_pretty()),
        }
    }
}
