//! Simulated people directory
//!
//! An in-process stand-in for a flaky remote list service. It serves a fixed
//! directory in pages, sleeps for a random latency, fails at random with a
//! server-style description, and now and then repeats the last record of the
//! previous page so overlapping pages reach the store.

use super::types::{FetchError, FetchResult, Page, PageFetcher};
use crate::error::{Error, Result};
use crate::types::{Cursor, Record};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Dennis", "Edsger", "Frances", "Grace", "Hedy", "John",
    "Ken", "Linus", "Margaret", "Niklaus", "Radia", "Tim",
];

const LAST_NAMES: &[&str] = &[
    "Hopper", "Turing", "Liskov", "Shannon", "Ritchie", "Dijkstra", "Allen", "Lamarr", "Backus",
    "Thompson", "Torvalds", "Hamilton", "Wirth", "Perlman", "Berners-Lee",
];

const FAILURE_DESCRIPTIONS: &[&str] = &["Internal Server Error", "Service Unavailable"];

/// Settings for the simulated source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedConfig {
    /// Number of people in the directory (0 gives an empty list)
    pub total_records: usize,
    /// Records per page
    pub page_size: usize,
    /// Probability that a call fails
    pub failure_rate: f64,
    /// Probability that a page repeats the previous page's last record
    pub duplicate_rate: f64,
    /// Lower latency bound in milliseconds
    pub min_latency_ms: u64,
    /// Upper latency bound in milliseconds
    pub max_latency_ms: u64,
    /// Seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            total_records: 57,
            page_size: 20,
            failure_rate: 0.1,
            duplicate_rate: 0.3,
            min_latency_ms: 200,
            max_latency_ms: 1200,
            seed: None,
        }
    }
}

impl SimulatedConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(Error::invalid_value(
                "failure_rate",
                "must be between 0 and 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.duplicate_rate) {
            return Err(Error::invalid_value(
                "duplicate_rate",
                "must be between 0 and 1",
            ));
        }
        if self.min_latency_ms > self.max_latency_ms {
            return Err(Error::invalid_value(
                "min_latency_ms",
                "must not exceed max_latency_ms",
            ));
        }
        Ok(())
    }
}

/// In-memory page source with random latency, failures and overlap
#[derive(Debug)]
pub struct SimulatedSource {
    people: Vec<Record>,
    config: SimulatedConfig,
    rng: Mutex<StdRng>,
}

impl SimulatedSource {
    /// Build a source from validated settings
    pub fn new(config: SimulatedConfig) -> Result<Self> {
        config.validate()?;

        let people = (0..config.total_records)
            .map(|i| {
                let first = FIRST_NAMES[i % FIRST_NAMES.len()];
                let last = LAST_NAMES[(i / FIRST_NAMES.len()) % LAST_NAMES.len()];
                Record::new(i as i64 + 1, format!("{first} {last}"))
            })
            .collect();

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            people,
            config,
            rng: Mutex::new(rng),
        })
    }

    /// Full directory in source order
    pub fn people(&self) -> &[Record] {
        &self.people
    }

    /// Roll latency, failure and overlap for one call
    fn roll(&self) -> (Duration, bool, bool) {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let latency = rng.random_range(self.config.min_latency_ms..=self.config.max_latency_ms);
        let fail = rng.random_bool(self.config.failure_rate);
        let overlap = rng.random_bool(self.config.duplicate_rate);
        (Duration::from_millis(latency), fail, overlap)
    }

    /// Slice the directory at `offset` without any randomness
    fn page_at(&self, offset: usize, overlap: bool) -> Page {
        let end = (offset + self.config.page_size).min(self.people.len());
        let start = if overlap && offset > 0 {
            offset - 1
        } else {
            offset
        };
        let records = self.people[start.min(end)..end].to_vec();

        let next_cursor = (end < self.people.len()).then(|| Cursor::new(end.to_string()));
        Page {
            records,
            next_cursor,
        }
    }
}

#[async_trait]
impl PageFetcher for SimulatedSource {
    async fn fetch(&self, cursor: Option<Cursor>) -> FetchResult {
        let offset = match &cursor {
            None => 0,
            Some(cursor) => cursor
                .as_str()
                .parse::<usize>()
                .ok()
                .filter(|offset| *offset <= self.people.len())
                .ok_or_else(|| FetchError::new("Parameter error"))?,
        };

        let (latency, fail, overlap) = self.roll();
        tokio::time::sleep(latency).await;

        if fail {
            let description = FAILURE_DESCRIPTIONS[offset % FAILURE_DESCRIPTIONS.len()];
            debug!("Simulated failure at offset {}: {}", offset, description);
            return Err(FetchError::new(description));
        }

        Ok(self.page_at(offset, overlap))
    }
}
