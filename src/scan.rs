//! Remote hierarchy traversal for `metasniff`.
//!
//! This module handles:
//! - Breadth-first walking of the remote folder tree with an explicit work queue
//! - Concurrent folder listing on a dedicated rayon pool using `crossbeam-channel`
//! - Deduplication of folders and files with `DashSet`/`DashMap`
//! - Retry with backoff for transient fetch failures
//! - Pause/stop checkpoints between folders, pages and retries
//!
//! The main entry point is [`traverse`], which returns either the id-ordered
//! file records plus the list of folders that could not be scanned, or
//! [`TraversalOutcome::Aborted`] when the session was stopped mid-walk.
//!
//! A folder's children are only acted on once every page of its listing has
//! been fetched. A folder that fails part way through contributes nothing, so
//! no partially listed folder ever reaches the result set.

use crate::client::{ParentRef, RemoteDirectoryClient};
use crate::config::{ExtractionConfig, RetryPolicy};
use crate::control::{Checkpoint, ControlPlane};
use crate::data::{FailedFolder, FileRecord, FolderNode, RemoteEntry, join_path};
use crate::error::{ExtractError, FetchError};
use crate::progress::ProgressTracker;
use crate::thread_pool::build_worker_pool;
use crate::utils::sort_records;
use crossbeam_channel::{RecvTimeoutError, Sender, unbounded};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// How long an idle worker waits for queued folders before re-checking
/// whether the walk is over.
const IDLE_POLL: Duration = Duration::from_millis(20);

/// Everything a traversal reads from its session.
#[derive(Clone, Copy)]
pub struct ScanContext<'a> {
    pub client: &'a dyn RemoteDirectoryClient,
    pub control: &'a ControlPlane,
    pub progress: &'a ProgressTracker,
    pub config: &'a ExtractionConfig,
}

/// Records and failures of a walk that ran to the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalResult {
    /// Sorted by ascending id
    pub records: Vec<FileRecord>,
    /// Sorted by path
    pub failed_folders: Vec<FailedFolder>,
    pub folders_scanned: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalOutcome {
    Finished(TraversalResult),
    /// The session left the running state before the queue drained
    Aborted,
}

/// Why a request, or a folder listing built from requests, gave up.
#[derive(Debug)]
pub(crate) enum RetryError {
    Aborted,
    Failed { reason: String, attempts: u32 },
    Fatal(String),
}

/// Shared state of one walk.
struct Walk<'a> {
    ctx: ScanContext<'a>,
    queue: Sender<FolderNode>,
    pending: AtomicUsize,
    visited: DashSet<String>,
    records: DashMap<String, FileRecord>,
    failed: Mutex<Vec<FailedFolder>>,
    fatal: Mutex<Option<String>>,
    folders_scanned: AtomicU64,
}

/// Walks the tree below `root` and collects every file record.
///
/// # Arguments
/// * `ctx` - Client, control plane, progress counters and configuration
/// * `root` - The starting folder (a folder id, or the account root)
///
/// # Returns
/// * `Ok(TraversalOutcome::Finished)` - Queue drained; records are id-sorted
/// * `Ok(TraversalOutcome::Aborted)` - Stopped (or failed elsewhere) mid-walk
///
/// # Errors
/// * [`ExtractError::FatalAuth`] - A request was rejected for authorization
///   reasons; the control plane has already been moved to `Failed`
/// * [`ExtractError::Pool`] - The worker pool could not be built
pub fn traverse(ctx: ScanContext<'_>, root: FolderNode) -> Result<TraversalOutcome, ExtractError> {
    let workers = ctx.config.worker_count;
    let pool = build_worker_pool(workers)?;
    let (tx, rx) = unbounded::<FolderNode>();

    let walk = Walk {
        ctx,
        queue: tx,
        pending: AtomicUsize::new(0),
        visited: DashSet::new(),
        records: DashMap::new(),
        failed: Mutex::new(Vec::new()),
        fatal: Mutex::new(None),
        folders_scanned: AtomicU64::new(0),
    };

    if let Some(id) = &root.id {
        walk.visited.insert(id.clone());
    }
    tracing::info!(root = %root.resolved_path, workers, "Starting traversal");
    walk.enqueue(root);

    pool.scope(|s| {
        for _ in 0..workers {
            let rx = rx.clone();
            let walk = &walk;
            s.spawn(move |_| {
                loop {
                    if walk.ctx.control.checkpoint() == Checkpoint::Abort {
                        break;
                    }
                    if walk.pending.load(Ordering::SeqCst) == 0 {
                        break;
                    }
                    match rx.recv_timeout(IDLE_POLL) {
                        Ok(node) => {
                            walk.scan_folder(node);
                            walk.pending.fetch_sub(1, Ordering::SeqCst);
                        }
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            });
        }
    });

    if let Some(message) = walk.fatal.lock().take() {
        return Err(ExtractError::FatalAuth(message));
    }
    if walk.pending.load(Ordering::SeqCst) != 0 || ctx.control.state().is_terminal() {
        tracing::info!("Traversal aborted");
        return Ok(TraversalOutcome::Aborted);
    }

    let mut records: Vec<FileRecord> = walk.records.into_iter().map(|(_, r)| r).collect();
    sort_records(&mut records);

    let mut failed_folders = walk.failed.into_inner();
    failed_folders.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.id.cmp(&b.id)));

    let folders_scanned = walk.folders_scanned.load(Ordering::SeqCst);
    tracing::info!(
        files = records.len(),
        folders = folders_scanned,
        failed = failed_folders.len(),
        "Traversal finished"
    );

    Ok(TraversalOutcome::Finished(TraversalResult {
        records,
        failed_folders,
        folders_scanned,
    }))
}

/// Runs `request`, retrying transient failures per `policy`.
///
/// The control plane is consulted after every backoff sleep, so a stop
/// never waits for the remaining attempts.
pub(crate) fn fetch_with_retry<T, F>(
    policy: &RetryPolicy,
    control: &ControlPlane,
    mut request: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Result<T, FetchError>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match request() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_fatal() => return Err(RetryError::Fatal(e.to_string())),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::debug!(attempt, ?delay, "Retrying after transient failure: {}", e);
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                if control.checkpoint() == Checkpoint::Abort {
                    return Err(RetryError::Aborted);
                }
            }
            Err(e) => {
                return Err(RetryError::Failed {
                    reason: e.to_string(),
                    attempts: attempt,
                });
            }
        }
    }
}

impl Walk<'_> {
    fn enqueue(&self, node: FolderNode) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        // The receiver outlives every worker, so a send cannot fail while
        // the walk is running.
        if self.queue.send(node).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn scan_folder(&self, node: FolderNode) {
        if self.ctx.control.checkpoint() == Checkpoint::Abort {
            return;
        }
        self.ctx.progress.enter_folder(&node.resolved_path);
        tracing::debug!(path = %node.resolved_path, depth = node.depth, "Listing folder");

        match self.list_all(&node) {
            Ok(entries) => {
                if self.ctx.control.checkpoint() == Checkpoint::Abort {
                    return;
                }
                self.classify(&node, entries);
                self.folders_scanned.fetch_add(1, Ordering::SeqCst);
                self.ctx.progress.folder_scanned();
            }
            Err(RetryError::Aborted) => {}
            Err(RetryError::Failed { reason, attempts }) => {
                let id = node
                    .id
                    .clone()
                    .unwrap_or_else(|| ParentRef::AccountRoot.label().to_string());
                tracing::warn!(
                    folder = %id,
                    path = %node.resolved_path,
                    attempts,
                    "Folder could not be scanned: {}",
                    reason
                );
                self.failed.lock().push(FailedFolder {
                    id,
                    path: node.resolved_path,
                    reason,
                    attempts,
                });
                self.ctx.progress.folder_failed();
            }
            Err(RetryError::Fatal(message)) => {
                tracing::error!("Fatal error while listing {}: {}", node.resolved_path, message);
                let mut fatal = self.fatal.lock();
                if fatal.is_none() {
                    *fatal = Some(message);
                }
                drop(fatal);
                self.ctx.control.fail();
            }
        }
    }

    /// Fetches every page of `node`'s children.
    fn list_all(&self, node: &FolderNode) -> Result<Vec<RemoteEntry>, RetryError> {
        let parent = match &node.id {
            Some(id) => ParentRef::Folder(id),
            None => ParentRef::AccountRoot,
        };

        let mut entries = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.fetch(|| self.ctx.client.list_children(parent, cursor.as_deref()))?;
            entries.extend(page.entries);
            match page.next_cursor {
                Some(next) => {
                    if self.ctx.control.checkpoint() == Checkpoint::Abort {
                        return Err(RetryError::Aborted);
                    }
                    cursor = Some(next);
                }
                None => return Ok(entries),
            }
        }
    }

    fn fetch<T, F>(&self, request: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Result<T, FetchError>,
    {
        fetch_with_retry(&self.ctx.config.retry, self.ctx.control, request)
    }

    /// Queues child folders and records files of one fully listed folder.
    fn classify(&self, node: &FolderNode, entries: Vec<RemoteEntry>) {
        let include_trashed = self.ctx.config.include_trashed;

        for entry in entries {
            if entry.trashed && !include_trashed {
                continue;
            }

            if entry.is_folder() {
                if self.visited.insert(entry.id.clone()) {
                    let child = node.child(entry.id.clone(), &entry.name);
                    self.enqueue(child);
                } else {
                    tracing::debug!(folder = %entry.id, "Folder already visited, skipping");
                }
                continue;
            }

            let path = join_path(&node.resolved_path, &entry.name);
            let size = entry.size;
            let record = FileRecord::from_entry(entry, path);

            match self.records.entry(record.id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                    self.ctx.progress.file_found(size);
                }
                Entry::Occupied(mut slot) => {
                    if record.path < slot.get().path {
                        slot.insert(record);
                    }
                }
            }
        }
    }
}
