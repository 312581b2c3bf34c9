//! Cache module for addon manifest documents
//!
//! This module provides `ManifestCache`, an in-memory cache that serves fresh
//! manifests without network access, lets concurrent callers share a single
//! in-flight fetch per URL, and spaces outbound requests by a global minimum
//! interval. Nothing is persisted; the cache lives as long as its owner.

mod config;
mod manager;

pub use config::{CacheConfig, CACHE_DURATION, MIN_REQUEST_INTERVAL, PEER_WAIT_TIMEOUT, RATE_LIMIT_BACKOFF};
pub use manager::{CacheStats, ManifestCache};
