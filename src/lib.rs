//! syncio-manifest library
//!
//! Exposes the manifest cache, the manifest fetching boundary and the CLI
//! configuration for use by the binary and integration tests.

pub mod cache;
pub mod cli;
pub mod logging;
pub mod manifest;

pub use cache::{CacheConfig, CacheStats, ManifestCache};
pub use manifest::{FetchError, HttpManifestSource, ManifestSource, ManifestSummary};
