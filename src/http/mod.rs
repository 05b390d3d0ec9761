//! HTTP client module
//!
//! Transport for the HTTP page fetcher.
//!
//! # Features
//!
//! - **Single attempt**: failures surface immediately, retry is gated upstream
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Error classification**: status, rate limit and timeout errors

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
