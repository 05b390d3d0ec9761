//! Configuration for a paginated feed
//!
//! A feed file describes the list timings and the page source, in YAML or
//! JSON:
//!
//! ```yaml
//! list:
//!   error_retry_delay_secs: 5
//!   empty_refresh_delay_secs: 3
//!   backoff: exponential
//! source:
//!   type: http
//!   base_url: "https://directory.example.com"
//!   path: "/people"
//!   cursor_param: next
//! ```
//!
//! Every field has a default; an empty file runs the simulated directory.

use crate::controller::ControllerConfig;
use crate::error::{Error, Result};
use crate::fetch::{HttpFetcherConfig, HttpPageFetcher, PageFetcher, SimulatedConfig, SimulatedSource};
use crate::store::StoreConfig;
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

// ============================================================================
// Top-Level Feed Config
// ============================================================================

/// Complete feed configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// List timings
    #[serde(default)]
    pub list: ListSettings,

    /// Where pages come from
    #[serde(default)]
    pub source: SourceConfig,
}

impl FeedConfig {
    /// Load and validate a config file
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };

        debug!("Loaded feed config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        self.list.validate()?;
        self.source.validate()
    }

    /// Controller settings derived from the list section
    pub fn controller_config(&self) -> ControllerConfig {
        self.list.controller_config()
    }
}

// ============================================================================
// List Settings
// ============================================================================

/// Timings of the list controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSettings {
    /// Countdown after a failed fetch
    #[serde(default = "default_error_retry_delay")]
    pub error_retry_delay_secs: u32,

    /// Countdown on the empty-state refresh
    #[serde(default = "default_empty_refresh_delay")]
    pub empty_refresh_delay_secs: u32,

    /// Growth of the retry countdown across consecutive failures
    #[serde(default)]
    pub backoff: BackoffType,

    /// Upper bound for the retry countdown
    #[serde(default = "default_max_retry_delay")]
    pub max_retry_delay_secs: u32,

    /// Length of one countdown tick in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Delay before a pull-to-refresh resets the list
    #[serde(default = "default_pull_to_refresh_delay_ms")]
    pub pull_to_refresh_delay_ms: u64,
}

fn default_error_retry_delay() -> u32 {
    5
}

fn default_empty_refresh_delay() -> u32 {
    3
}

fn default_max_retry_delay() -> u32 {
    60
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_pull_to_refresh_delay_ms() -> u64 {
    300
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            error_retry_delay_secs: default_error_retry_delay(),
            empty_refresh_delay_secs: default_empty_refresh_delay(),
            backoff: BackoffType::default(),
            max_retry_delay_secs: default_max_retry_delay(),
            tick_interval_ms: default_tick_interval_ms(),
            pull_to_refresh_delay_ms: default_pull_to_refresh_delay_ms(),
        }
    }
}

impl ListSettings {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(Error::invalid_value(
                "list.tick_interval_ms",
                "must be at least 1",
            ));
        }
        if self.max_retry_delay_secs < self.error_retry_delay_secs {
            return Err(Error::invalid_value(
                "list.max_retry_delay_secs",
                "must not be below error_retry_delay_secs",
            ));
        }
        Ok(())
    }

    /// Store timing policy
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            error_retry_delay_secs: self.error_retry_delay_secs,
            empty_refresh_delay_secs: self.empty_refresh_delay_secs,
            backoff: self.backoff,
            max_retry_delay_secs: self.max_retry_delay_secs,
        }
    }

    /// Controller settings
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            store: self.store_config(),
            tick_period: Duration::from_millis(self.tick_interval_ms),
            pull_to_refresh_delay: Duration::from_millis(self.pull_to_refresh_delay_ms),
        }
    }
}

// ============================================================================
// Source Config
// ============================================================================

/// Page source selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Remote JSON endpoint
    Http(HttpFetcherConfig),
    /// In-memory people directory
    Simulated(SimulatedConfig),
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Simulated(SimulatedConfig::default())
    }
}

impl SourceConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Http(config) => {
                url::Url::parse(&config.base_url)?;
                if config.cursor_param.is_empty() {
                    return Err(Error::invalid_value(
                        "source.cursor_param",
                        "cannot be empty",
                    ));
                }
                Ok(())
            }
            Self::Simulated(config) => config.validate(),
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Simulated(_) => "simulated",
        }
    }

    /// Build the fetcher this source describes
    pub fn build_fetcher(&self) -> Result<Arc<dyn PageFetcher>> {
        let fetcher: Arc<dyn PageFetcher> = match self {
            Self::Http(config) => Arc::new(HttpPageFetcher::new(config)?),
            Self::Simulated(config) => Arc::new(SimulatedSource::new(config.clone())?),
        };
        Ok(fetcher)
    }
}
