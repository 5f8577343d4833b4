//! Data structures for representing remote drive entries and extracted records.
//!
//! [`RemoteEntry`] is the shape returned by the remote directory service (one
//! item of a `files.list` page). [`FileRecord`] is the fixed-shape forensic
//! record produced by the traversal, with its hierarchy path fully resolved.

use serde::{Deserialize, Deserializer, Serialize};

/// MIME type the remote service uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Represents the kind of remote entry.
///
/// # Variants
/// * `File` - Any non-folder item
/// * `Folder` - A container whose children are listed recursively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryKind {
    File,
    Folder,
}

impl EntryKind {
    /// Returns a string representation of the entry kind.
    ///
    /// # Returns
    /// * `"FILE"` for `EntryKind::File`
    /// * `"FOLDER"` for `EntryKind::Folder`
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "FILE",
            EntryKind::Folder => "FOLDER",
        }
    }
}

/// A user reference as reported by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A single sharing permission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// One child entry as returned by the remote directory service.
///
/// Integer fields arrive as decimal strings from the service and as plain
/// numbers from hand-written listings; both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub modified_time: Option<String>,
    #[serde(default)]
    pub viewed_by_me_time: Option<String>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub size: Option<u64>,
    #[serde(default)]
    pub md5_checksum: Option<String>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub version: Option<u64>,
    #[serde(default)]
    pub owners: Vec<User>,
    #[serde(default)]
    pub last_modifying_user: Option<User>,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub web_view_link: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub trashed: bool,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl RemoteEntry {
    pub fn kind(&self) -> EntryKind {
        if self.mime_type == FOLDER_MIME_TYPE {
            EntryKind::Folder
        } else {
            EntryKind::File
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind() == EntryKind::Folder
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Text(String),
}

fn de_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::Text(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Forensic record for one file discovered during traversal.
///
/// The set of fields is fixed; the forensic hash reads a stable subset of them
/// (see [`crate::hash`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub created_time: Option<String>,
    pub modified_time: Option<String>,
    pub viewed_by_me_time: Option<String>,
    pub size: Option<u64>,
    pub md5_checksum: Option<String>,
    pub version: Option<u64>,
    pub owner_email: Option<String>,
    pub owner_name: Option<String>,
    pub last_modifying_user_email: Option<String>,
    pub last_modifying_user_name: Option<String>,
    pub shared: bool,
    pub permission_count: usize,
    /// `type:role` pairs joined with `"; "`
    pub permission_summary: Option<String>,
    pub web_view_link: Option<String>,
    pub parents: Vec<String>,
    /// Resolved hierarchy, e.g. `Root/Sub/File.pdf`
    pub path: String,
    pub trashed: bool,
    pub starred: bool,
    pub description: Option<String>,
}

impl FileRecord {
    /// Builds a record from a listed entry and its resolved path.
    pub fn from_entry(entry: RemoteEntry, path: String) -> Self {
        let owner = entry.owners.into_iter().next().unwrap_or_default();
        let modifier = entry.last_modifying_user.unwrap_or_default();

        let permission_summary = if entry.permissions.is_empty() {
            None
        } else {
            let pairs: Vec<String> = entry
                .permissions
                .iter()
                .map(|p| {
                    format!(
                        "{}:{}",
                        p.kind.as_deref().unwrap_or("unknown"),
                        p.role.as_deref().unwrap_or("unknown")
                    )
                })
                .collect();
            Some(pairs.join("; "))
        };

        Self {
            id: entry.id,
            name: entry.name,
            mime_type: entry.mime_type,
            created_time: entry.created_time,
            modified_time: entry.modified_time,
            viewed_by_me_time: entry.viewed_by_me_time,
            size: entry.size,
            md5_checksum: entry.md5_checksum,
            version: entry.version,
            owner_email: owner.email_address,
            owner_name: owner.display_name,
            last_modifying_user_email: modifier.email_address,
            last_modifying_user_name: modifier.display_name,
            shared: entry.shared,
            permission_count: entry.permissions.len(),
            permission_summary,
            web_view_link: entry.web_view_link,
            parents: entry.parents,
            path,
            trashed: entry.trashed,
            starred: entry.starred,
            description: entry.description,
        }
    }

    /// Human-readable file type derived from the MIME type.
    pub fn file_type(&self) -> String {
        file_type_label(&self.mime_type)
    }
}

/// Maps a MIME type to the label shown in reports.
pub fn file_type_label(mime_type: &str) -> String {
    let known = match mime_type {
        FOLDER_MIME_TYPE => "Folder",
        "application/vnd.google-apps.document" => "Google Docs",
        "application/vnd.google-apps.spreadsheet" => "Google Sheets",
        "application/vnd.google-apps.presentation" => "Google Slides",
        "application/pdf" => "PDF",
        "image/jpeg" => "JPEG Image",
        "image/png" => "PNG Image",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "Word",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "Excel",
        "text/plain" => "Text",
        other => return other.rsplit('/').next().unwrap_or(other).to_uppercase(),
    };
    known.to_string()
}

/// A folder waiting in the traversal work queue.
///
/// Exists only while the walk runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    /// `None` for the account root
    pub id: Option<String>,
    pub resolved_path: String,
    /// Distance from the session root (root = 0)
    pub depth: u32,
}

impl FolderNode {
    pub fn root(id: Option<String>, label: String) -> Self {
        Self {
            id,
            resolved_path: label,
            depth: 0,
        }
    }

    /// Child folder node with its path resolved against this one.
    pub fn child(&self, id: String, name: &str) -> Self {
        Self {
            id: Some(id),
            resolved_path: join_path(&self.resolved_path, name),
            depth: self.depth + 1,
        }
    }
}

/// Joins a parent path and a child name with `/`.
pub fn join_path(parent: &str, name: &str) -> String {
    format!("{parent}/{name}")
}

/// A folder whose subtree could not be scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFolder {
    pub id: String,
    pub path: String,
    pub reason: String,
    pub attempts: u32,
}
