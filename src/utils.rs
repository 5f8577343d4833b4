//! Utility functions for the `metasniff` tool.
//!
//! This module provides:
//! - Shared-link normalisation for folder references
//! - Stable ordering of extracted records
//! - Timestamp and size formatting for reports

use crate::data::FileRecord;
use crate::error::ConfigError;
use chrono::DateTime;
use humansize::{DECIMAL, format_size};
use regex::Regex;
use std::sync::LazyLock;

/// Shared-link shapes that carry a folder id, tried in order:
/// `/drive/folders/<ID>`, `/open?id=<ID>`, and any `?id=`/`&id=` query.
static FOLDER_LINK_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"/drive/(?:u/\d+/)?folders/([A-Za-z0-9_-]+)").expect("Invalid folder link regex"),
        Regex::new(r"/open\?id=([A-Za-z0-9_-]+)").expect("Invalid open link regex"),
        Regex::new(r"[?&]id=([A-Za-z0-9_-]+)").expect("Invalid id query regex"),
    ]
});

/// Reduces a folder id or shared link to a bare folder id.
///
/// Bare ids (no scheme, `/` or `?`) pass through unchanged. Links are matched
/// against the known shared-link shapes.
///
/// # Errors
/// Returns [`ConfigError::InvalidFolderReference`] for empty input or a link
/// that carries no recognisable id.
///
/// # Examples
/// ```rust
/// use metasniff::utils::normalize_folder_reference;
///
/// let id = normalize_folder_reference(
///     "https://drive.google.com/drive/folders/1AbC-xyz_9?usp=sharing",
/// ).unwrap();
/// assert_eq!(id, "1AbC-xyz_9");
/// ```
pub fn normalize_folder_reference(input: &str) -> Result<String, ConfigError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ConfigError::InvalidFolderReference(input.to_string()));
    }

    if !input.starts_with("http") && !input.contains('/') && !input.contains('?') {
        return Ok(input.to_string());
    }

    FOLDER_LINK_PATTERNS
        .iter()
        .find_map(|re| re.captures(input))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ConfigError::InvalidFolderReference(input.to_string()))
}

/// Sorts records by ascending id, the emission order of every report.
pub fn sort_records(records: &mut [FileRecord]) {
    records.sort_by(|a, b| a.id.cmp(&b.id));
}

/// Formats an RFC 3339 timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
///
/// Unparseable values are returned unchanged; missing values become `N/A`.
pub fn format_timestamp(raw: Option<&str>) -> String {
    match raw {
        None | Some("") => "N/A".to_string(),
        Some(value) => match DateTime::parse_from_rfc3339(value) {
            Ok(dt) => dt
                .with_timezone(&chrono::Utc)
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string(),
            Err(_) => value.to_string(),
        },
    }
}

/// Human-readable size, or `N/A` for items without one.
pub fn format_optional_size(size: Option<u64>) -> String {
    size.map(|s| format_size(s, DECIMAL))
        .unwrap_or_else(|| "N/A".to_string())
}
