//! Tuning knobs for the manifest cache

use std::time::Duration;

/// How long a stored manifest stays fresh
pub const CACHE_DURATION: Duration = Duration::from_secs(5 * 60);

/// Minimum spacing between any two outbound fetches
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

/// How long a caller waits for a peer's in-flight fetch before fetching itself
pub const PEER_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Courtesy delay before reporting a 429 response to the caller
pub const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(5);

/// Configuration for `ManifestCache`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Entries older than this are treated as absent
    pub cache_duration: Duration,
    /// Global floor between outbound requests, across all URLs
    pub min_request_interval: Duration,
    /// Upper bound on waiting for another caller's fetch of the same URL
    pub peer_wait_timeout: Duration,
    /// Delay applied after a 429 before returning; zero disables it
    pub rate_limit_backoff: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_duration: CACHE_DURATION,
            min_request_interval: MIN_REQUEST_INTERVAL,
            peer_wait_timeout: PEER_WAIT_TIMEOUT,
            rate_limit_backoff: RATE_LIMIT_BACKOFF,
        }
    }
}
