//! Output formatting and persistence for aggregate results.
//!
//! Supports a human-readable log summary, JSON to stdout, and JSON to a file.

use anyhow::Result;
use tracing::{debug, info};

use crate::aggregate::{SourceOutcome, SourceResult};

/// Logs one line per source: record count or the client-facing error.
pub fn print_summary(results: &[SourceResult]) {
    for result in results {
        match &result.outcome {
            SourceOutcome::Data(records) => {
                info!(line = %result.line, records = records.len(), "Source OK");
            }
            SourceOutcome::Error(message) => {
                info!(line = %result.line, error = %message, "Source failed");
            }
        }
    }
}

/// Renders results as the pretty-printed JSON array served to clients.
pub fn to_json(results: &[SourceResult]) -> Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

/// Writes results as pretty-printed JSON, replacing any existing file.
pub fn write_json(path: &str, results: &[SourceResult]) -> Result<()> {
    debug!(path, sources = results.len(), "Writing aggregate JSON");
    std::fs::write(path, to_json(results)?)?;
    Ok(())
}
