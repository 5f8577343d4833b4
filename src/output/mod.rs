//! Export adapters for finished extractions.
//!
//! Each renderer takes a completed [`ExtractionReport`] and writes it in one
//! format. Renderers never reorder or filter records; the report is already
//! id-sorted and holds exactly what was collected.
//!
//! # Available Formatters
//!
//! - **CSV**: One row per file for spreadsheet review
//! - **JSON**: Full report with summary, digest and records
//! - **Terminal**: Human-readable run summary

pub mod csv;
pub mod json;
pub mod terminal;

use crate::cli::OutputFormat;
use crate::session::ExtractionReport;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Terminal output renderer function.
///
/// See [`terminal::render`] for full documentation.
pub use terminal::render as render_terminal;

/// Writes the report files selected by `format` next to `base`.
///
/// `base` is a path without extension; `.csv` and `.json` are appended.
/// Returns the paths written, in that order.
pub fn export(report: &ExtractionReport, base: &Path, format: OutputFormat) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if format.wants_csv() {
        let path = base.with_extension("csv");
        csv::write_file(report, &path)?;
        written.push(path);
    }
    if format.wants_json() {
        let path = base.with_extension("json");
        json::write_file(report, &path)?;
        written.push(path);
    }

    Ok(written)
}

/// Default base name: `metadata_<YYYYmmdd_HHMMSS>`.
pub fn default_base_name() -> String {
    format!("metadata_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}
