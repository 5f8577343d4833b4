//! CSV output formatter for extracted records.

use crate::data::FileRecord;
use crate::session::ExtractionReport;
use crate::utils::{format_optional_size, format_timestamp};
use anyhow::{Context, Result};
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::Path;

/// One CSV row. Column order is the header order.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    name: &'a str,
    path: &'a str,
    file_type: String,
    mime_type: &'a str,
    size_bytes: Option<u64>,
    size_human: String,
    created: String,
    modified: String,
    last_viewed: String,
    owner_email: Option<&'a str>,
    owner_name: Option<&'a str>,
    last_modified_by_email: Option<&'a str>,
    last_modified_by_name: Option<&'a str>,
    shared: bool,
    permission_count: usize,
    permissions: Option<&'a str>,
    md5_checksum: Option<&'a str>,
    version: Option<u64>,
    trashed: bool,
    starred: bool,
    description: Option<&'a str>,
    web_view_link: Option<&'a str>,
    parents: String,
}

impl<'a> From<&'a FileRecord> for CsvRow<'a> {
    fn from(r: &'a FileRecord) -> Self {
        Self {
            id: &r.id,
            name: &r.name,
            path: &r.path,
            file_type: r.file_type(),
            mime_type: &r.mime_type,
            size_bytes: r.size,
            size_human: format_optional_size(r.size),
            created: format_timestamp(r.created_time.as_deref()),
            modified: format_timestamp(r.modified_time.as_deref()),
            last_viewed: format_timestamp(r.viewed_by_me_time.as_deref()),
            owner_email: r.owner_email.as_deref(),
            owner_name: r.owner_name.as_deref(),
            last_modified_by_email: r.last_modifying_user_email.as_deref(),
            last_modified_by_name: r.last_modifying_user_name.as_deref(),
            shared: r.shared,
            permission_count: r.permission_count,
            permissions: r.permission_summary.as_deref(),
            md5_checksum: r.md5_checksum.as_deref(),
            version: r.version,
            trashed: r.trashed,
            starred: r.starred,
            description: r.description.as_deref(),
            web_view_link: r.web_view_link.as_deref(),
            parents: r.parents.join(";"),
        }
    }
}

/// Renders the report's records as CSV into `writer`.
///
/// # Note
/// Rows come out in report order (ascending id); nothing is filtered here.
pub fn render<W: io::Write>(report: &ExtractionReport, writer: W) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);

    for record in &report.records {
        csv_writer.serialize(CsvRow::from(record))?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Renders into a new file at `path`.
pub fn write_file(report: &ExtractionReport, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    render(report, file)?;
    tracing::info!("CSV output written to: {}", path.display());
    Ok(())
}
