//! Terminal summary of a finished extraction.

use crate::session::ExtractionReport;
use crate::utils::format_optional_size;
use anyhow::Result;
use std::io::Write;

/// Writes a human-readable summary of `report` to `out`.
///
/// # Note
/// Lists every failed folder with its reason so an incomplete run is never
/// mistaken for a complete one.
pub fn render<W: Write>(report: &ExtractionReport, out: &mut W) -> Result<()> {
    let summary = &report.summary;
    let elapsed = summary.finished_at - summary.started_at;

    writeln!(out, "Root:            {}", summary.root_path)?;
    if let Some(id) = &summary.root_folder_id {
        writeln!(out, "Root ID:         {}", id)?;
    }
    writeln!(out, "Files:           {}", summary.files_found)?;
    writeln!(out, "Folders scanned: {}", summary.folders_scanned)?;
    writeln!(
        out,
        "Total size:      {}",
        format_optional_size(Some(summary.bytes_processed))
    )?;
    writeln!(
        out,
        "Trashed items:   {}",
        if summary.include_trashed { "included" } else { "excluded" }
    )?;
    writeln!(out, "Workers:         {}", summary.worker_count)?;
    writeln!(
        out,
        "Duration:        {:.2}s",
        elapsed.num_milliseconds() as f64 / 1000.0
    )?;
    writeln!(out, "{}:         {}", report.hash_algorithm, report.digest)?;

    if let Some(notice) = summary.failure_notice() {
        writeln!(out)?;
        writeln!(out, "[WARN] {} (excluded from digest):", notice)?;
        for failed in &summary.failed_folders {
            writeln!(
                out,
                "[FAIL] {} ({}) after {} attempt(s): {}",
                failed.path, failed.id, failed.attempts, failed.reason
            )?;
        }
    }

    Ok(())
}
