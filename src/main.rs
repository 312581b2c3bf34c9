//! syncio-manifest - Fetch Stremio addon manifests through a shared cache
//!
//! Fetches every URL given on the command line concurrently through one
//! `ManifestCache`, optionally several rounds in a row, and prints the
//! manifests to stdout. Diagnostics go to stderr.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use futures::future::join_all;
use serde_json::Value;

use syncio_manifest::cli::{Cli, OutputMode, StartupConfig};
use syncio_manifest::logging;
use syncio_manifest::{HttpManifestSource, ManifestCache, ManifestSummary};

/// Exit status when an argument is parsed but unusable
const EXIT_USAGE: u8 = 2;

/// Prints one fetch result in the selected output mode
///
/// Returns `false` if the manifest was unavailable.
fn print_result(
    url: &str,
    result: Option<&Arc<Value>>,
    output: OutputMode,
) -> Result<bool, serde_json::Error> {
    let Some(manifest) = result else {
        eprintln!("{url}: manifest unavailable");
        return Ok(false);
    };

    match output {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(&**manifest)?),
        OutputMode::Summary => match ManifestSummary::from_value(manifest) {
            Some(summary) => println!("{}", summary.display_line()),
            None => println!("{url}: not a valid addon manifest"),
        },
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(ExitCode::from(EXIT_USAGE));
        }
    };

    if let Err(e) = logging::init(&config.log) {
        eprintln!("warning: logging disabled: {e}");
    }

    let source = HttpManifestSource::with_config(&config.http)?;
    let cache = ManifestCache::with_source(source, config.cache.clone());

    let mut all_available = true;
    for round in 1..=config.repeat {
        if config.repeat > 1 {
            eprintln!("--- round {round}/{} ---", config.repeat);
        }

        let results = join_all(config.urls.iter().map(|url| cache.fetch_manifest(url))).await;

        all_available = true;
        for (url, result) in config.urls.iter().zip(&results) {
            all_available &= print_result(url, result.as_ref(), config.output)?;
        }
    }

    if config.show_stats {
        eprintln!("{}", serde_json::to_string_pretty(&cache.cache_stats())?);
    }

    Ok(if all_available {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
