/// Structured logging for rainfall statistics runs
///
/// Library code logs through `tracing` with a `stage` field naming the
/// pipeline step. The binary calls `init` once; output goes to stderr, or
/// to an append-only log file for unattended runs.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::ingest::LoadStats;
use crate::model::RainfallError;

/// Crate targets that receive the CLI-selected level.
const CRATE_TARGETS: &[&str] = &["rainfall_stats"];

// ---------------------------------------------------------------------------
// Initialisation
// ---------------------------------------------------------------------------

/// Maps CLI verbosity to a level name.
///
/// - 0 (none) -> warn
/// - 1 (-v)   -> info
/// - 2 (-vv)  -> debug
/// - 3+       -> trace
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn default_filter(verbosity: u8) -> String {
    let level = level_for(verbosity);
    CRATE_TARGETS
        .iter()
        .map(|t| format!("{t}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the global subscriber. `RUST_LOG` overrides the verbosity flag.
pub fn init(verbosity: u8, log_file: Option<&Path>) -> Result<(), RainfallError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| RainfallError::Output {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Summary logging
// ---------------------------------------------------------------------------

/// Logs how many source rows survived parsing.
///
/// Info when nothing was dropped, warn when some rows were dropped, error
/// when rows were read but none were usable.
pub fn log_load_summary(source: &str, stats: &LoadStats) {
    let message = format!(
        "Load complete: {}/{} rows used, {} dropped ({} bad amount, {} bad year)",
        stats.rows_used,
        stats.rows_read,
        stats.dropped_rows(),
        stats.dropped_amount,
        stats.dropped_year
    );

    if stats.dropped_rows() == 0 {
        info!(stage = "load", source, "{message}");
    } else if stats.rows_used == 0 {
        error!(stage = "load", source, "{message}");
    } else {
        warn!(stage = "load", source, "{message}");
    }
}
