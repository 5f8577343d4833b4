//! Shared helpers for integration tests: entry builders and a directory
//! client wrapper that injects failures and can hold a fetch open.

#![allow(dead_code)]

use crossbeam_channel::{Receiver, Sender, bounded};
use metasniff::client::{Page, ParentRef, RemoteDirectoryClient, SnapshotClient};
use metasniff::config::{ExtractionConfig, RetryPolicy};
use metasniff::data::{FOLDER_MIME_TYPE, RemoteEntry};
use metasniff::error::FetchError;
use metasniff::session::{ExtractionReport, ExtractionSession, RunOutcome};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn folder(id: &str, name: &str, parent: Option<&str>) -> RemoteEntry {
    RemoteEntry {
        id: id.into(),
        name: name.into(),
        mime_type: FOLDER_MIME_TYPE.into(),
        parents: parent.map(|p| vec![p.to_string()]).unwrap_or_default(),
        ..Default::default()
    }
}

pub fn file(id: &str, name: &str, parent: &str, size: u64) -> RemoteEntry {
    RemoteEntry {
        id: id.into(),
        name: name.into(),
        mime_type: "text/plain".into(),
        size: Some(size),
        md5_checksum: Some(format!("md5-{id}")),
        created_time: Some("2024-03-01T09:30:00.000Z".into()),
        modified_time: Some("2024-03-02T17:45:00.000Z".into()),
        parents: vec![parent.to_string()],
        ..Default::default()
    }
}

pub fn trashed(mut entry: RemoteEntry) -> RemoteEntry {
    entry.trashed = true;
    entry
}

/// `Root{ a.txt(id=2), Sub{ b.txt(id=1) } }`
pub fn example_tree() -> Vec<RemoteEntry> {
    vec![
        folder("root", "Root", None),
        file("2", "a.txt", "root", 100),
        folder("sub", "Sub", Some("root")),
        file("1", "b.txt", "sub", 200),
    ]
}

/// A root with `folders` subfolders of `files` files each, plus two files
/// directly under the root.
pub fn wide_tree(folders: usize, files: usize) -> Vec<RemoteEntry> {
    let mut entries = vec![
        folder("root", "Root", None),
        file("root-f0", "top0.txt", "root", 1),
        file("root-f1", "top1.txt", "root", 2),
    ];
    for d in 0..folders {
        let dir_id = format!("d{d:02}");
        entries.push(folder(&dir_id, &format!("Dir{d:02}"), Some("root")));
        for f in 0..files {
            entries.push(file(
                &format!("{dir_id}-f{f}"),
                &format!("file{f}.txt"),
                &dir_id,
                (d * 10 + f) as u64,
            ));
        }
    }
    entries
}

/// Holds the Nth listing request open until released.
struct Gate {
    at: usize,
    reached: Sender<()>,
    release: Receiver<()>,
}

/// Handle for a gated fetch.
pub struct GateHandle {
    reached: Receiver<()>,
    release: Sender<()>,
}

impl GateHandle {
    /// Waits until the gated request is in flight.
    pub fn wait_reached(&self) {
        self.reached
            .recv_timeout(Duration::from_secs(10))
            .expect("gated fetch never reached");
    }

    /// Lets the gated request return.
    pub fn release(&self) {
        self.release.send(()).expect("gate already released");
    }
}

/// Wraps a [`SnapshotClient`] with scripted failures on listing requests.
pub struct FaultyClient {
    inner: SnapshotClient,
    always_fail: HashMap<String, FetchError>,
    flaky: Mutex<HashMap<String, u32>>,
    fatal_at: Option<usize>,
    gate: Option<Gate>,
    listings: AtomicUsize,
}

impl FaultyClient {
    pub fn new(entries: Vec<RemoteEntry>) -> Self {
        Self::from_snapshot(SnapshotClient::from_entries(entries))
    }

    pub fn from_snapshot(inner: SnapshotClient) -> Self {
        Self {
            inner,
            always_fail: HashMap::new(),
            flaky: Mutex::new(HashMap::new()),
            fatal_at: None,
            gate: None,
            listings: AtomicUsize::new(0),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.inner = self.inner.with_page_size(page_size);
        self
    }

    /// Every listing of `folder_id` fails with `error`.
    pub fn fail_always(mut self, folder_id: &str, error: FetchError) -> Self {
        self.always_fail.insert(folder_id.to_string(), error);
        self
    }

    /// The first `times` listings of `folder_id` fail transiently.
    pub fn fail_transiently(self, folder_id: &str, times: u32) -> Self {
        self.flaky.lock().insert(folder_id.to_string(), times);
        self
    }

    /// The `n`th listing request (1-based) fails with an authorization error.
    pub fn fatal_at(mut self, n: usize) -> Self {
        self.fatal_at = Some(n);
        self
    }

    /// Holds the `n`th listing request (1-based) open until released.
    pub fn gate_at(mut self, n: usize) -> (Self, GateHandle) {
        let (reached_tx, reached_rx) = bounded(1);
        let (release_tx, release_rx) = bounded(1);
        self.gate = Some(Gate {
            at: n,
            reached: reached_tx,
            release: release_rx,
        });
        (
            self,
            GateHandle {
                reached: reached_rx,
                release: release_tx,
            },
        )
    }

    /// Listing requests made so far, including failed ones.
    pub fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }
}

impl RemoteDirectoryClient for FaultyClient {
    fn folder(&self, id: &str) -> Result<RemoteEntry, FetchError> {
        self.inner.folder(id)
    }

    fn list_children(
        &self,
        parent: ParentRef<'_>,
        cursor: Option<&str>,
    ) -> Result<Page, FetchError> {
        let n = self.listings.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(gate) = &self.gate {
            if gate.at == n {
                let _ = gate.reached.send(());
                let _ = gate.release.recv_timeout(Duration::from_secs(10));
            }
        }

        if self.fatal_at == Some(n) {
            return Err(FetchError::Auth(
                "invalid_grant: Token has been expired or revoked.".into(),
            ));
        }

        if let ParentRef::Folder(id) = parent {
            if let Some(error) = self.always_fail.get(id) {
                return Err(error.clone());
            }
            let mut flaky = self.flaky.lock();
            if let Some(remaining) = flaky.get_mut(id) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(FetchError::Transient("429 rate limit exceeded".into()));
                }
            }
        }

        self.inner.list_children(parent, cursor)
    }
}

pub fn config(root: Option<&str>) -> ExtractionConfig {
    ExtractionConfig::new(root.map(String::from)).with_retry(RetryPolicy::immediate(3))
}

pub fn session<C>(client: C, config: ExtractionConfig) -> ExtractionSession
where
    C: RemoteDirectoryClient + 'static,
{
    ExtractionSession::new(Arc::new(client), config).expect("valid config")
}

/// Runs a fresh session to completion and returns its report.
pub fn extract(entries: Vec<RemoteEntry>, config: ExtractionConfig) -> ExtractionReport {
    let session = session(SnapshotClient::from_entries(entries), config);
    completed(session.run().expect("extraction failed"))
}

pub fn completed(outcome: RunOutcome) -> ExtractionReport {
    match outcome {
        RunOutcome::Completed(report) => *report,
        RunOutcome::Stopped => panic!("extraction was stopped"),
    }
}

pub fn ids(report: &ExtractionReport) -> Vec<&str> {
    report.records.iter().map(|r| r.id.as_str()).collect()
}
