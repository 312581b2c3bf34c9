//! In-memory manifest cache with request deduplication and rate limiting
//!
//! `ManifestCache` sits in front of a `ManifestSource`. Fresh entries are
//! served without network access, concurrent callers for the same URL share a
//! single in-flight fetch, and outbound fetches across all URLs are spaced by
//! a global minimum interval. Every failure collapses to `None`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use super::config::CacheConfig;
use crate::manifest::{FetchError, HttpManifestSource, ManifestSource};

/// Request slot used when `min_request_interval` overflows the clock
const FAR_FUTURE: std::time::Duration = std::time::Duration::from_secs(86_400 * 365 * 30);

/// Result of a fetch as seen by callers
type Outcome = Option<Arc<Value>>;

/// A stored manifest document
#[derive(Debug)]
struct CacheEntry {
    /// The parsed manifest
    data: Arc<Value>,
    /// When the manifest was stored
    stored_at: Instant,
}

/// Marker for a URL that is currently being fetched
///
/// Peers clone `done` and wait for the leader to publish its outcome.
#[derive(Debug)]
struct InFlight {
    id: u64,
    done: watch::Receiver<Option<Outcome>>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    pending: HashMap<String, InFlight>,
    /// Monotonic time of the most recent outbound request slot
    last_request: Option<Instant>,
    /// Wall-clock time of the most recent outbound request, for diagnostics
    last_request_at: Option<DateTime<Utc>>,
    next_flight_id: u64,
}

impl CacheState {
    /// Returns the entry for `url` if it is younger than `max_age`
    fn fresh(&self, url: &str, max_age: std::time::Duration) -> Option<Arc<Value>> {
        let entry = self.entries.get(url)?;
        if entry.stored_at.elapsed() < max_age {
            Some(Arc::clone(&entry.data))
        } else {
            None
        }
    }

    /// Marks `url` as pending, replacing any previous marker
    fn claim(&mut self, url: &str) -> (u64, watch::Sender<Option<Outcome>>) {
        let id = self.next_flight_id;
        self.next_flight_id += 1;
        let (tx, done) = watch::channel(None);
        self.pending.insert(url.to_string(), InFlight { id, done });
        (id, tx)
    }
}

/// What a caller should do after inspecting the cache
enum Lookup {
    /// A fresh entry was found
    Hit(Arc<Value>),
    /// Another caller is fetching this URL under the given flight id
    Join(u64, watch::Receiver<Option<Outcome>>),
    /// This caller now owns the fetch
    Lead(u64, watch::Sender<Option<Outcome>>),
}

/// Ownership of an in-flight fetch
///
/// Dropping it removes the pending marker it created, on every exit path
/// including cancellation. A marker that was cleared or replaced by a later
/// claim is left alone.
struct Flight<'a> {
    state: &'a Mutex<CacheState>,
    url: &'a str,
    id: u64,
    tx: watch::Sender<Option<Outcome>>,
}

impl Flight<'_> {
    /// Hands the outcome to every caller waiting on this fetch
    fn publish(&self, outcome: Outcome) {
        self.tx.send_replace(Some(outcome));
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.pending.get(self.url).is_some_and(|f| f.id == self.id) {
            state.pending.remove(self.url);
        }
    }
}

/// Read-only snapshot of the cache for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of stored entries, stale ones included
    pub cache_size: usize,
    /// Number of URLs with a fetch in flight
    pub pending_requests_count: usize,
    /// When the most recent outbound request was issued
    pub last_request_time: Option<DateTime<Utc>>,
}

/// Deduplicating, rate-limited cache of addon manifests
///
/// One instance is meant to live for the whole process and be shared by
/// reference (or `Arc`) between the flows that need manifests. The internal
/// lock is never held across an `.await`.
pub struct ManifestCache<S = HttpManifestSource> {
    source: S,
    config: CacheConfig,
    state: Mutex<CacheState>,
}

impl ManifestCache<HttpManifestSource> {
    /// Creates a cache that fetches over HTTP with a default client
    pub fn new(config: CacheConfig) -> Self {
        Self::with_source(HttpManifestSource::new(), config)
    }
}

impl<S: ManifestSource> ManifestCache<S> {
    /// Creates a cache in front of the given source
    pub fn with_source(source: S, config: CacheConfig) -> Self {
        Self {
            source,
            config,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Returns the configuration this cache was built with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the underlying manifest source
    pub fn source(&self) -> &S {
        &self.source
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches the manifest at `url`
    ///
    /// # Returns
    /// * `Some(manifest)` - From a fresh cache entry, a peer's fetch, or a new fetch
    /// * `None` - If `url` is empty or the manifest is unavailable right now
    ///
    /// # Behavior
    /// - A fresh entry is returned without network access
    /// - If another caller is already fetching `url`, waits up to
    ///   `peer_wait_timeout` and shares its outcome, success or failure
    /// - If that wait times out or the peer is cancelled, fetches itself,
    ///   unless another timed-out caller already started a newer fetch, in
    ///   which case it waits on that one instead. A caller falls through to
    ///   its own fetch at most once, so at most one extra request per URL is
    ///   outstanding after the wait ceiling
    /// - New fetches are delayed until `min_request_interval` has passed
    ///   since the previous outbound request of any URL
    /// - A 429 response is held for `rate_limit_backoff` before returning
    ///   `None`; callers joining during that window get `None` at once
    pub async fn fetch_manifest(&self, url: &str) -> Option<Arc<Value>> {
        if url.is_empty() {
            return None;
        }

        let mut waited_on = None;
        let (id, tx) = loop {
            match self.lookup(url, waited_on) {
                Lookup::Hit(data) => return Some(data),
                Lookup::Lead(id, tx) => break (id, tx),
                Lookup::Join(id, done) => {
                    if let Some(outcome) = self.wait_for_peer(url, done).await {
                        return outcome;
                    }
                    if waited_on.is_some() {
                        return self.state().fresh(url, self.config.cache_duration);
                    }
                    waited_on = Some(id);
                }
            }
        };

        let flight = Flight {
            state: &self.state,
            url,
            id,
            tx,
        };
        self.lead(flight).await
    }

    /// Checks for a fresh entry, then joins or claims the fetch for `url`
    ///
    /// Runs under a single lock acquisition so that at most one caller can
    /// claim a URL. A marker whose id is `abandoned` (a flight this caller
    /// already gave up on) is replaced instead of joined.
    fn lookup(&self, url: &str, abandoned: Option<u64>) -> Lookup {
        let mut state = self.state();
        if let Some(data) = state.fresh(url, self.config.cache_duration) {
            debug!(url, "manifest cache hit");
            return Lookup::Hit(data);
        }
        if let Some(flight) = state.pending.get(url) {
            if abandoned != Some(flight.id) {
                debug!(url, flight = flight.id, "joining in-flight manifest fetch");
                return Lookup::Join(flight.id, flight.done.clone());
            }
        }
        let (id, tx) = state.claim(url);
        Lookup::Lead(id, tx)
    }

    /// Waits for a peer's fetch to finish
    ///
    /// Returns `None` if the wait timed out or the peer went away without
    /// publishing, in which case the caller fetches itself.
    async fn wait_for_peer(
        &self,
        url: &str,
        mut done: watch::Receiver<Option<Outcome>>,
    ) -> Option<Outcome> {
        let waited = time::timeout(self.config.peer_wait_timeout, async {
            done.wait_for(|outcome| outcome.is_some())
                .await
                .map(|outcome| (*outcome).clone().flatten())
        })
        .await;

        match waited {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(_)) => {
                debug!(url, "in-flight manifest fetch was abandoned");
                None
            }
            Err(_) => {
                warn!(
                    url,
                    timeout_ms =
                        u64::try_from(self.config.peer_wait_timeout.as_millis()).unwrap_or(u64::MAX),
                    "timed out waiting for in-flight manifest fetch"
                );
                None
            }
        }
    }

    /// Performs the outbound fetch for a claimed URL
    async fn lead(&self, flight: Flight<'_>) -> Option<Arc<Value>> {
        let url = flight.url;

        let slot = self.reserve_request_slot();
        let now = Instant::now();
        if slot > now {
            debug!(
                url,
                delay_ms = u64::try_from((slot - now).as_millis()).unwrap_or(u64::MAX),
                "delaying manifest fetch for rate limit"
            );
            time::sleep_until(slot).await;
        }
        self.state().last_request_at = Some(Utc::now());

        match self.source.fetch(url).await {
            Ok(value) => {
                let data = Arc::new(value);
                self.state().entries.insert(
                    url.to_string(),
                    CacheEntry {
                        data: Arc::clone(&data),
                        stored_at: Instant::now(),
                    },
                );
                info!(url, "manifest cached");
                flight.publish(Some(Arc::clone(&data)));
                Some(data)
            }
            Err(FetchError::RateLimited { retry_after }) => {
                warn!(
                    url,
                    retry_after_secs = retry_after.map(|d| d.as_secs()),
                    "manifest fetch rate limited by upstream"
                );
                flight.publish(None);
                if !self.config.rate_limit_backoff.is_zero() {
                    time::sleep(self.config.rate_limit_backoff).await;
                }
                None
            }
            Err(err) => {
                warn!(url, error = %err, "manifest fetch failed");
                flight.publish(None);
                None
            }
        }
    }

    /// Reserves the next outbound request slot and returns when it starts
    ///
    /// Reservation happens under the lock, so concurrent callers are spaced
    /// by `min_request_interval` even when none of them has slept yet.
    fn reserve_request_slot(&self) -> Instant {
        let mut state = self.state();
        let now = Instant::now();
        let slot = match state.last_request {
            Some(last) => last
                .checked_add(self.config.min_request_interval)
                .or_else(|| now.checked_add(FAR_FUTURE))
                .unwrap_or(now)
                .max(now),
            None => now,
        };
        state.last_request = Some(slot);
        slot
    }

    /// Drops every entry and pending marker
    ///
    /// The rate-limit clock is kept, so a fetch right after a clear still
    /// waits out the interval since the previous request.
    pub fn clear_cache(&self) {
        let mut state = self.state();
        state.entries.clear();
        state.pending.clear();
        debug!("manifest cache cleared");
    }

    /// Returns a snapshot of the cache counters
    pub fn cache_stats(&self) -> CacheStats {
        let state = self.state();
        CacheStats {
            cache_size: state.entries.len(),
            pending_requests_count: state.pending.len(),
            last_request_time: state.last_request_at,
        }
    }
}
