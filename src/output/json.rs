//! JSON report formatter.
//!
//! The document has two top-level keys: `extraction` (when, how, digest and
//! summary) and `files` (the id-sorted records).

use crate::session::ExtractionReport;
use anyhow::{Context, Result};
use serde_json::json;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Builds the report document.
pub fn to_value(report: &ExtractionReport) -> serde_json::Value {
    json!({
        "extraction": {
            "timestamp": report.summary.finished_at.to_rfc3339(),
            "hash_algorithm": report.hash_algorithm,
            "digest": report.digest,
            "complete": report.summary.complete,
            "notice": report.summary.failure_notice(),
            "summary": report.summary,
        },
        "files": report.records,
    })
}

/// Pretty-prints the report document into `writer`.
pub fn render<W: Write>(report: &ExtractionReport, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, &to_value(report))?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Renders into a new file at `path`.
pub fn write_file(report: &ExtractionReport, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON file {}", path.display()))?;
    render(report, BufWriter::new(file))?;
    tracing::info!("JSON output written to: {}", path.display());
    Ok(())
}
