//! Command-line interface parsing for syncio-manifest
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the cache, HTTP and logging configuration the binary starts with.

use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::cache::CacheConfig;
use crate::logging::LogConfig;
use crate::manifest::{normalize_manifest_url, HttpSourceConfig, UrlError};

/// Error types for CLI argument validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// One of the URL arguments is not a usable addon URL
    #[error("Invalid URL argument '{input}': {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: UrlError,
    },

    /// `--repeat` must be at least 1
    #[error("--repeat must be at least 1")]
    ZeroRepeat,

    /// `--timeout` must be at least 1 second
    #[error("--timeout must be at least 1 second")]
    ZeroTimeout,
}

/// syncio-manifest - Fetch Stremio addon manifests through a shared cache
#[derive(Parser, Debug)]
#[command(name = "syncio-manifest")]
#[command(about = "Fetch Stremio addon manifests through a deduplicating, rate-limited cache")]
#[command(version)]
pub struct Cli {
    /// Addon URLs; stremio:// links and base URLs are accepted
    ///
    /// Examples:
    ///   syncio-manifest https://v3-cinemeta.strem.io/manifest.json
    ///   syncio-manifest stremio://addon.example.com --summary
    #[arg(value_name = "URL", required = true)]
    pub urls: Vec<String>,

    /// Seconds a fetched manifest stays fresh
    #[arg(long, value_name = "SECS", default_value_t = 300)]
    pub cache_ttl: u64,

    /// Minimum milliseconds between outbound requests
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub min_interval: u64,

    /// Milliseconds to wait for a duplicate in-flight fetch
    #[arg(long, value_name = "MS", default_value_t = 5000)]
    pub peer_wait: u64,

    /// Milliseconds to hold back after an HTTP 429 response
    #[arg(long, value_name = "MS", default_value_t = 5000)]
    pub backoff: u64,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Fetch the URL list this many times through the same cache
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub repeat: u32,

    /// Print one summary line per manifest instead of the JSON document
    #[arg(long)]
    pub summary: bool,

    /// Print cache statistics after the last round
    #[arg(long)]
    pub stats: bool,

    /// Log level written to stderr (trace, debug, info, warn, error, off)
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,
}

/// How fetched manifests are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Pretty-printed JSON document
    #[default]
    Json,
    /// One `ManifestSummary` line per manifest
    Summary,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Normalized manifest URLs, in argument order
    pub urls: Vec<String>,
    /// Cache tuning
    pub cache: CacheConfig,
    /// HTTP client settings
    pub http: HttpSourceConfig,
    /// Logging settings
    pub log: LogConfig,
    /// Number of fetch rounds
    pub repeat: u32,
    /// Output format
    pub output: OutputMode,
    /// Whether to print cache statistics at the end
    pub show_stats: bool,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with normalized URLs and derived settings
    /// * `Err(CliError)` if a URL is unusable or a count is zero
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.repeat == 0 {
            return Err(CliError::ZeroRepeat);
        }
        if cli.timeout == 0 {
            return Err(CliError::ZeroTimeout);
        }

        let urls = cli
            .urls
            .iter()
            .map(|input| {
                normalize_manifest_url(input).map_err(|source| CliError::InvalidUrl {
                    input: input.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StartupConfig {
            urls,
            cache: CacheConfig {
                cache_duration: Duration::from_secs(cli.cache_ttl),
                min_request_interval: Duration::from_millis(cli.min_interval),
                peer_wait_timeout: Duration::from_millis(cli.peer_wait),
                rate_limit_backoff: Duration::from_millis(cli.backoff),
            },
            http: HttpSourceConfig {
                timeout: Duration::from_secs(cli.timeout),
                ..Default::default()
            },
            log: LogConfig {
                level: LogConfig::parse_level(&cli.log_level),
            },
            repeat: cli.repeat,
            output: if cli.summary {
                OutputMode::Summary
            } else {
                OutputMode::Json
            },
            show_stats: cli.stats,
        })
    }
}
