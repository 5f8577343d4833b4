//! Access to the remote directory service.
//!
//! The traversal only needs two requests: look up a folder by id, and list one
//! page of a folder's children. [`RemoteDirectoryClient`] is the seam between
//! the walk and whatever transport serves those requests.
//!
//! [`SnapshotClient`] serves them from a recorded `files.list` dump
//! (`{"files": [...]}`), paging the children of each folder the way the live
//! service does. It is what the command-line tool and the test suite run
//! against.

use crate::config::ACCOUNT_ROOT_LABEL;
use crate::data::RemoteEntry;
use crate::error::FetchError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Parent selector for a listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef<'a> {
    /// Top level of the whole account
    AccountRoot,
    Folder(&'a str),
}

impl ParentRef<'_> {
    pub fn label(&self) -> &str {
        match self {
            ParentRef::AccountRoot => ACCOUNT_ROOT_LABEL,
            ParentRef::Folder(id) => id,
        }
    }
}

/// One page of a children listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub entries: Vec<RemoteEntry>,
    /// Opaque cursor for the next page; `None` on the last page
    pub next_cursor: Option<String>,
}

/// Requests the traversal makes against the remote directory service.
///
/// Implementations are shared by all workers and must be safe to call
/// concurrently.
pub trait RemoteDirectoryClient: Send + Sync {
    /// Metadata of a single item by id.
    fn folder(&self, id: &str) -> Result<RemoteEntry, FetchError>;

    /// One page of the direct children of `parent`, trashed items included.
    fn list_children(
        &self,
        parent: ParentRef<'_>,
        cursor: Option<&str>,
    ) -> Result<Page, FetchError>;
}

#[derive(Deserialize)]
struct Listing {
    #[serde(default)]
    files: Vec<RemoteEntry>,
}

/// Replays a recorded listing.
///
/// Entries whose parents are all absent from the listing are treated as
/// children of the account root. Children keep the order they appear in the
/// listing; cursors are page offsets.
#[derive(Debug, Clone)]
pub struct SnapshotClient {
    entries: HashMap<String, RemoteEntry>,
    children: HashMap<String, Vec<String>>,
    top_level: Vec<String>,
    page_size: usize,
}

impl SnapshotClient {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open snapshot {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let listing: Listing =
            serde_json::from_reader(reader).context("Snapshot is not a files listing")?;
        Ok(Self::from_entries(listing.files))
    }

    pub fn from_entries(entries: Vec<RemoteEntry>) -> Self {
        let known: HashSet<String> = entries.iter().map(|e| e.id.clone()).collect();
        let mut by_id = HashMap::with_capacity(entries.len());
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        let mut top_level = Vec::new();

        for entry in entries {
            if by_id.contains_key(&entry.id) {
                continue;
            }
            let mut parents: Vec<&String> =
                entry.parents.iter().filter(|p| known.contains(*p)).collect();
            parents.sort();
            parents.dedup();
            for parent in &parents {
                children
                    .entry((*parent).clone())
                    .or_default()
                    .push(entry.id.clone());
            }
            if parents.is_empty() {
                top_level.push(entry.id.clone());
            }
            by_id.insert(entry.id.clone(), entry);
        }

        Self {
            entries: by_id,
            children,
            top_level,
            page_size: crate::config::DEFAULT_PAGE_SIZE,
        }
    }

    /// Children per page. Zero is treated as one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RemoteDirectoryClient for SnapshotClient {
    fn folder(&self, id: &str) -> Result<RemoteEntry, FetchError> {
        self.entries
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(id.to_string()))
    }

    fn list_children(
        &self,
        parent: ParentRef<'_>,
        cursor: Option<&str>,
    ) -> Result<Page, FetchError> {
        let ids: &[String] = match parent {
            ParentRef::AccountRoot => &self.top_level,
            ParentRef::Folder(id) => {
                let folder = self
                    .entries
                    .get(id)
                    .ok_or_else(|| FetchError::NotFound(id.to_string()))?;
                if !folder.is_folder() {
                    return Err(FetchError::NotAFolder(id.to_string()));
                }
                self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
            }
        };

        let offset = match cursor {
            None => 0,
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|&n| n <= ids.len())
                .ok_or_else(|| FetchError::Protocol(format!("invalid page cursor '{raw}'")))?,
        };

        let end = (offset + self.page_size).min(ids.len());
        let entries = ids[offset..end]
            .iter()
            .filter_map(|id| self.entries.get(id).cloned())
            .collect();
        let next_cursor = (end < ids.len()).then(|| end.to_string());

        Ok(Page {
            entries,
            next_cursor,
        })
    }
}
