//! HTTP page fetcher
//!
//! Requests `GET {base_url}{path}?{cursor_param}={cursor}` and decodes a JSON
//! envelope. Common envelope shapes:
//! - `{ "people": [...], "next": "c2" }`
//! - `{ "records": [...], "next_cursor": null }`
//! - `{ "error": "Internal Server Error" }`

use super::types::{FetchError, FetchResult, Page, PageFetcher};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig};
use crate::types::{Cursor, Record};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Settings for the HTTP page fetcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpFetcherConfig {
    /// Base URL of the remote source
    pub base_url: String,
    /// Path of the list endpoint
    #[serde(default = "default_path")]
    pub path: String,
    /// Query parameter carrying the cursor
    #[serde(default = "default_cursor_param")]
    pub cursor_param: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Optional request throttle
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,
    /// `User-Agent` override, `pagefeed/<version>` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_path() -> String {
    "/people".to_string()
}

fn default_cursor_param() -> String {
    "next".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl HttpFetcherConfig {
    /// Create a config with defaults for everything but the base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: default_path(),
            cursor_param: default_cursor_param(),
            timeout_secs: default_timeout_secs(),
            headers: HashMap::new(),
            rate_limit: None,
            user_agent: None,
        }
    }

    /// Set the endpoint path
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the cursor query parameter name
    #[must_use]
    pub fn with_cursor_param(mut self, param: impl Into<String>) -> Self {
        self.cursor_param = param.into();
        self
    }
}

/// Wire shape of a page response
#[derive(Debug, Deserialize)]
struct PageEnvelope {
    #[serde(default, alias = "people", alias = "items")]
    records: Option<Vec<Record>>,
    #[serde(default, alias = "next", alias = "nextCursor")]
    next_cursor: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl PageEnvelope {
    fn into_page(self) -> FetchResult {
        match (self.records, self.error) {
            (_, Some(error)) => Err(FetchError::new(error)),
            (Some(records), None) => Ok(Page {
                records,
                next_cursor: Cursor::from_wire(self.next_cursor),
            }),
            (None, None) => Err(Error::decode("response carried neither records nor an error").into()),
        }
    }
}

/// Page fetcher backed by a JSON HTTP endpoint
#[derive(Debug)]
pub struct HttpPageFetcher {
    client: HttpClient,
    path: String,
    cursor_param: String,
}

impl HttpPageFetcher {
    /// Build a fetcher from its settings
    pub fn new(config: &HttpFetcherConfig) -> Result<Self> {
        let mut builder = HttpClientConfig::builder()
            .base_url(&config.base_url)
            .timeout(Duration::from_secs(config.timeout_secs));
        for (key, value) in &config.headers {
            builder = builder.header(key, value);
        }
        if let Some(limit) = config.rate_limit {
            builder = builder.rate_limit(limit);
        }
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent);
        }

        Ok(Self {
            client: HttpClient::with_config(builder.build())?,
            path: config.path.clone(),
            cursor_param: config.cursor_param.clone(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, cursor: Option<Cursor>) -> FetchResult {
        let query: Vec<(&str, &str)> = cursor
            .iter()
            .map(|cursor| (self.cursor_param.as_str(), cursor.as_str()))
            .collect();

        let envelope: PageEnvelope = self.client.get_json(&self.path, &query).await?;
        let page = envelope.into_page()?;

        debug!(
            "Fetched {} records for cursor {:?}, next {:?}",
            page.records.len(),
            cursor.as_ref().map(Cursor::as_str),
            page.next_cursor.as_ref().map(Cursor::as_str)
        );
        Ok(page)
    }
}
