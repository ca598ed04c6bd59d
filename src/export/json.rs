//! JSON report of a check or repair run

use crate::error::{RepairError, Result};
use crate::pipeline::{PipelineResult, TrackOutcome};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// JSON output schema version
const SCHEMA_VERSION: &str = "1.0";

/// Top-level JSON output structure
#[derive(Debug, Serialize)]
pub struct ReportJson<'a> {
    /// Schema version for forward compatibility
    pub version: &'static str,
    pub metadata: ReportMetadata,
    pub summary: SummaryJson,
    pub warnings: Vec<String>,
    pub tracks: &'a [TrackOutcome],
}

#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    /// mp3repair version that generated this file
    pub generator_version: String,
    pub generated_at: String,
    pub command: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryJson {
    pub total_tracks: usize,
    pub clean: usize,
    pub needs_edit: usize,
    pub partial_error: usize,
    pub no_metadata: usize,
    pub repaired: usize,
    pub repair_failed: usize,
}

/// Write a run's outcome to `output_path`.
///
/// Written to a temporary file in the same directory and renamed into
/// place, so an interrupted write never leaves a truncated report.
pub fn write_report(result: &PipelineResult, command: &str, output_path: &Path) -> Result<()> {
    let report = ReportJson {
        version: SCHEMA_VERSION,
        metadata: ReportMetadata {
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            command: command.to_string(),
        },
        summary: SummaryJson {
            total_tracks: result.total_tracks,
            clean: result.clean,
            needs_edit: result.needs_edit,
            partial_error: result.partial_error,
            no_metadata: result.no_metadata,
            repaired: result.repaired,
            repair_failed: result.repair_failed,
        },
        warnings: result.no_consensus.iter().map(|w| w.to_string()).collect(),
        tracks: &result.tracks,
    };

    let dir: PathBuf = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let temp = tempfile::Builder::new()
        .prefix(".mp3repair-report-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|e| RepairError::file_write(output_path, e))?;

    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, &report).map_err(|e| {
            RepairError::file_write(output_path, std::io::Error::new(std::io::ErrorKind::Other, e))
        })?;
        writer
            .flush()
            .map_err(|e| RepairError::file_write(output_path, e))?;
    }

    // a failed persist drops the temp file, which deletes it
    temp.persist(output_path).map_err(|e| RepairError::FileRename {
        path: output_path.to_path_buf(),
        source: e.error,
    })?;

    info!(
        "Wrote report for {} tracks to {}",
        result.tracks.len(),
        output_path.display()
    );
    Ok(())
}
