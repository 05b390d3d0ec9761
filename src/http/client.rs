//! Single-attempt JSON client for the remote page source
//!
//! Each GET is sent once. A 429, a timeout or any non-2xx status becomes an
//! [`Error`] straight away; the list store decides when to ask again.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Seconds to report when a 429 carries no usable `retry-after`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Transport settings shared by every page request
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Root that relative paths are joined onto
    pub base_url: Option<String>,
    /// Per-request deadline
    pub timeout: Duration,
    /// Throttle applied before each send
    pub rate_limit: Option<RateLimiterConfig>,
    /// Headers sent with every request
    pub default_headers: HashMap<String, String>,
    /// Value of the `User-Agent` header
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            rate_limit: None,
            default_headers: HashMap::new(),
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
        }
    }
}

impl HttpClientConfig {
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for [`HttpClientConfig`]
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// GET-only client with an optional throttle
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Build the client, rejecting a base URL that does not parse
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        if let Some(base) = &config.base_url {
            Url::parse(base)?;
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// GET `path` with `query` and decode the body as JSON
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let body = self.get(path, query).await?.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::decode(format!("invalid JSON body: {e}")))
    }

    /// GET `path` with `query`, mapping failure statuses to errors
    ///
    /// The body of a failed response is kept in [`Error::HttpStatus`].
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response> {
        let url = self.resolve(path);

        if let Some(limiter) = &self.rate_limiter {
            limiter.wait().await;
        }

        let response = self.request(&url, query).send().await.map_err(|e| {
            warn!("GET {} failed: {}", url, e);
            if e.is_timeout() {
                Error::Timeout {
                    timeout_ms: self.config.timeout.as_millis() as u64,
                }
            } else {
                Error::Http(e)
            }
        })?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_seconds = retry_after(&response);
                warn!("GET {} rate limited, retry after {}s", url, retry_after_seconds);
                Err(Error::RateLimited {
                    retry_after_seconds,
                })
            }
            status if status.is_client_error() || status.is_server_error() => {
                warn!("GET {} returned {}", url, status.as_u16());
                let body = response.text().await.unwrap_or_default();
                Err(Error::http_status(status.as_u16(), body))
            }
            _ => {
                debug!("GET {} ok", url);
                Ok(response)
            }
        }
    }

    fn request(&self, url: &str, query: &[(&str, &str)]) -> RequestBuilder {
        let mut request = self.client.get(url);
        for (key, value) in &self.config.default_headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        request
    }

    /// Join `path` onto the base URL unless it is already absolute
    fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        match &self.config.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => path.to_string(),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("throttled", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

fn retry_after(response: &Response) -> u64 {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}
