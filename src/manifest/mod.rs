//! Addon manifest fetching and helpers
//!
//! This module contains the network boundary used by the manifest cache and
//! the helpers consumers use around it: URL normalization for pasted addon
//! links and a typed summary of a fetched manifest.

pub mod source;
pub mod summary;
pub mod url;

pub use source::{FetchError, HttpManifestSource, HttpSourceConfig, ManifestSource};
pub use summary::ManifestSummary;
pub use url::{normalize_manifest_url, UrlError};
