//! Deterministic forensic digest over extracted records.
//!
//! Each record is reduced to a canonical line built from a fixed field list:
//!
//! ```text
//! id|name|mime_type|created_time|modified_time|size|md5_checksum|description|trashed
//! ```
//!
//! Lines are ordered by ascending `id` and joined with `\n` before hashing, so
//! the digest does not depend on traversal order or worker scheduling. Fields
//! that can change without the file itself changing (view times, sharing,
//! ownership, path, version) are left out.
//!
//! Escaping keeps the encoding injective: `\` becomes `\\`, `|` becomes `\|`,
//! and line breaks become `\n`/`\r`. A missing optional field is written as the
//! token `\0`, which no escaped value can produce.

use crate::data::FileRecord;
use sha2::{Digest as _, Sha256};

/// Hash algorithm identifier used in reports.
pub const HASH_ALGORITHM: &str = "SHA-256";

/// Placeholder for an absent optional field.
pub const MISSING_FIELD: &str = "\\0";

const FIELD_SEPARATOR: char = '|';
const RECORD_SEPARATOR: &[u8] = b"\n";

/// Canonical line for one record.
pub fn canonical_record(record: &FileRecord) -> String {
    let size = record.size.map(|s| s.to_string());
    let fields: [Option<&str>; 9] = [
        Some(record.id.as_str()),
        Some(record.name.as_str()),
        Some(record.mime_type.as_str()),
        record.created_time.as_deref(),
        record.modified_time.as_deref(),
        size.as_deref(),
        record.md5_checksum.as_deref(),
        record.description.as_deref(),
        Some(if record.trashed { "true" } else { "false" }),
    ];

    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(FIELD_SEPARATOR);
        }
        match field {
            Some(value) => escape_into(&mut line, value),
            None => line.push_str(MISSING_FIELD),
        }
    }
    line
}

fn escape_into(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '|' => out.push_str("\\|"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
}

/// SHA-256 over the id-ordered canonical lines, as lowercase hex.
///
/// Input order does not matter; records are ordered by `id` here.
pub fn compute_hash(records: &[FileRecord]) -> String {
    let mut ordered: Vec<&FileRecord> = records.iter().collect();
    ordered.sort_by(|a, b| a.id.cmp(&b.id));

    let mut hasher = Sha256::new();
    for (i, record) in ordered.iter().enumerate() {
        if i > 0 {
            hasher.update(RECORD_SEPARATOR);
        }
        hasher.update(canonical_record(record).as_bytes());
    }

    let hash = hasher.finalize();
    format!("{hash:x}")
}
