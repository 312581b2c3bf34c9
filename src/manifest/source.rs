//! Network boundary for manifest fetches
//!
//! `ManifestSource` is the seam between the cache and the network. The
//! production implementation is `HttpManifestSource`, a thin reqwest wrapper
//! that classifies failures into `FetchError` variants.

use std::future::Future;
use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// Default timeout for a single manifest request
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur when fetching a manifest document
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered 429 Too Many Requests
    #[error("Rate limited by upstream")]
    RateLimited {
        /// Value of the `Retry-After` header, if it was given in seconds
        retry_after: Option<Duration>,
    },

    /// Upstream answered with a non-success status
    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    /// Response body was not valid JSON
    #[error("Failed to parse manifest JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Something that can fetch a manifest document by URL
///
/// The returned future must be `Send` so the cache can be driven from a
/// multi-threaded runtime.
pub trait ManifestSource: Send + Sync {
    /// Fetches and parses the JSON document at `url`
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// Configuration for the HTTP manifest source
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Timeout for the whole request, including reading the body
    pub timeout: Duration,
    /// Value sent in the `User-Agent` header
    pub user_agent: String,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: concat!("syncio-manifest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Fetches manifests over plain HTTP GET
#[derive(Debug, Clone)]
pub struct HttpManifestSource {
    /// HTTP client for making requests
    http_client: Client,
}

impl HttpManifestSource {
    /// Creates a source with a default reqwest client
    pub fn new() -> Self {
        Self {
            http_client: Client::new(),
        }
    }

    /// Creates a source with the given timeout and user agent
    ///
    /// # Returns
    /// * `Err(FetchError::Http)` if the underlying client cannot be built
    pub fn with_config(config: &HttpSourceConfig) -> Result<Self, FetchError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http_client })
    }
}

impl Default for HttpManifestSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestSource for HttpManifestSource {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .http_client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            return Err(FetchError::RateLimited { retry_after });
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Parses a `Retry-After` header given in delta-seconds
///
/// HTTP-date values are ignored.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
