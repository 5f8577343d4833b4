//! Extraction sessions.
//!
//! An [`ExtractionSession`] owns all mutable state of one run: the control
//! plane, the progress counters and the configuration. It is shared by `Arc`
//! between the thread that runs it and any controllers that pause, resume,
//! stop or observe it. A session runs at most once; after a stop a new one
//! must be created. [`SessionSlot`] is the controller-side holder that
//! enforces "one active session at a time".

use crate::client::{ParentRef, RemoteDirectoryClient};
use crate::config::{ACCOUNT_ROOT_LABEL, ExtractionConfig};
use crate::control::{ControlPlane, SessionState};
use crate::data::{FailedFolder, FileRecord, FolderNode};
use crate::error::{ControlError, ExtractError, Result};
use crate::hash::{HASH_ALGORITHM, compute_hash};
use crate::metrics::{PhaseTimer, ProfileData};
use crate::progress::{ProgressSnapshot, ProgressTracker};
use crate::scan::{RetryError, ScanContext, TraversalOutcome, fetch_with_retry, traverse};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Counts and failures reported alongside the records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionSummary {
    /// `None` when the whole account was walked
    pub root_folder_id: Option<String>,
    pub root_path: String,
    pub include_trashed: bool,
    pub worker_count: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub files_found: usize,
    pub folders_scanned: u64,
    pub bytes_processed: u64,
    pub failed_folders: Vec<FailedFolder>,
    /// False when any subtree could not be scanned; those files are absent
    /// from both the records and the digest
    pub complete: bool,
}

impl ExtractionSummary {
    /// "N folders could not be scanned", or `None` for a complete run.
    pub fn failure_notice(&self) -> Option<String> {
        match self.failed_folders.len() {
            0 => None,
            1 => Some("1 folder could not be scanned".to_string()),
            n => Some(format!("{n} folders could not be scanned")),
        }
    }
}

/// Output of a completed run, handed to the export adapters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionReport {
    /// Sorted by ascending id
    pub records: Vec<FileRecord>,
    pub digest: String,
    pub hash_algorithm: &'static str,
    pub summary: ExtractionSummary,
    #[serde(skip)]
    pub profile: ProfileData,
}

/// How a run ended, short of an error.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(Box<ExtractionReport>),
    /// Stopped by an operator; collected data was discarded
    Stopped,
}

/// One extraction run and its shared state.
pub struct ExtractionSession {
    client: Arc<dyn RemoteDirectoryClient>,
    config: ExtractionConfig,
    control: ControlPlane,
    progress: ProgressTracker,
}

impl ExtractionSession {
    /// Creates an idle session.
    ///
    /// # Errors
    /// Returns the validation error for an out-of-range configuration.
    pub fn new(
        client: Arc<dyn RemoteDirectoryClient>,
        config: ExtractionConfig,
    ) -> std::result::Result<Self, crate::error::ConfigError> {
        config.validate()?;
        Ok(Self {
            client,
            config,
            control: ControlPlane::new(),
            progress: ProgressTracker::new(),
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.control.state()
    }

    /// Consistent progress copy, tagged with the state at the same instant.
    pub fn get_progress(&self) -> ProgressSnapshot {
        self.progress.snapshot(|| self.control.state())
    }

    pub fn request_pause(&self) -> std::result::Result<(), ControlError> {
        self.control.request_pause()
    }

    pub fn request_resume(&self) -> std::result::Result<(), ControlError> {
        self.control.request_resume()
    }

    /// Stops the run and zeroes its progress in one step. No reader can see
    /// the stopped state with stale counters, or zeroed counters while
    /// still running.
    pub fn request_stop(&self) -> std::result::Result<(), ControlError> {
        self.progress.reset_on(|| self.control.request_stop())
    }

    /// Runs the extraction to a terminal state on the calling thread.
    ///
    /// # Errors
    /// * [`ExtractError::InvalidRoot`] - The root is missing, not a folder, or
    ///   still unreachable after the retries; the session stays `Idle`
    /// * [`ExtractError::FatalAuth`] - Authorization failed; state is `Failed`
    /// * [`ExtractError::Control`] - The session was already used
    pub fn run(&self) -> Result<RunOutcome> {
        self.control.ensure_idle()?;
        let root = self.resolve_root()?;

        self.control.start()?;
        self.progress.mark_started();
        let started_at = Utc::now();
        tracing::info!(root = %root.resolved_path, "Extraction started");

        let mut profile = ProfileData::new();
        let ctx = ScanContext {
            client: self.client.as_ref(),
            control: &self.control,
            progress: &self.progress,
            config: &self.config,
        };

        let timer = PhaseTimer::new("Traversal");
        let outcome = traverse(ctx, root.clone());
        profile.add_phase(timer.finish());

        let result = match outcome {
            Ok(TraversalOutcome::Finished(result)) => result,
            Ok(TraversalOutcome::Aborted) => return self.aborted(),
            Err(e) => {
                let state = self.control.fail();
                self.progress.mark_finished();
                tracing::error!(%state, "Extraction failed: {}", e);
                return Err(e);
            }
        };

        let (digest, timing) = crate::time_phase!("Hashing", { compute_hash(&result.records) });
        profile.add_phase(timing);
        profile.add_metadata("workers", &self.config.worker_count.to_string());
        profile.add_metadata("files", &result.records.len().to_string());
        profile.add_metadata("folders", &result.folders_scanned.to_string());

        match self.control.complete() {
            SessionState::Completed => {}
            _ => return self.aborted(),
        }
        self.progress.mark_finished();

        let summary = ExtractionSummary {
            root_folder_id: root.id.clone(),
            root_path: root.resolved_path,
            include_trashed: self.config.include_trashed,
            worker_count: self.config.worker_count,
            started_at,
            finished_at: Utc::now(),
            files_found: result.records.len(),
            folders_scanned: result.folders_scanned,
            bytes_processed: result.records.iter().filter_map(|r| r.size).sum(),
            complete: result.failed_folders.is_empty(),
            failed_folders: result.failed_folders,
        };

        if let Some(notice) = summary.failure_notice() {
            tracing::warn!("{}", notice);
        }
        tracing::info!(
            files = summary.files_found,
            folders = summary.folders_scanned,
            digest = %digest,
            "Extraction completed"
        );

        Ok(RunOutcome::Completed(Box::new(ExtractionReport {
            records: result.records,
            digest,
            hash_algorithm: HASH_ALGORITHM,
            summary,
            profile,
        })))
    }

    fn aborted(&self) -> Result<RunOutcome> {
        match self.control.state() {
            SessionState::Failed => Err(ExtractError::FatalAuth(
                "session failed during traversal".to_string(),
            )),
            state => {
                tracing::info!(%state, "Extraction stopped; collected data discarded");
                Ok(RunOutcome::Stopped)
            }
        }
    }

    /// Looks up the root before anything starts, retrying transient failures
    /// like any listing. The account root needs no lookup.
    fn resolve_root(&self) -> Result<FolderNode> {
        let Some(id) = &self.config.root_folder_id else {
            return Ok(FolderNode::root(None, ACCOUNT_ROOT_LABEL.to_string()));
        };

        let invalid = |reason: String| ExtractError::InvalidRoot {
            id: id.clone(),
            reason,
        };

        let lookup = fetch_with_retry(&self.config.retry, &self.control, || {
            self.client.folder(id)
        });
        match lookup {
            Ok(entry) if entry.is_folder() => {
                let label = if entry.name.is_empty() {
                    ParentRef::Folder(id).label().to_string()
                } else {
                    entry.name
                };
                Ok(FolderNode::root(Some(id.clone()), label))
            }
            Ok(_) => Err(invalid("not a folder".to_string())),
            Err(RetryError::Fatal(message)) => {
                // Idle → Failed: revoked credentials end the session before it starts.
                self.control.fail();
                Err(ExtractError::FatalAuth(message))
            }
            Err(RetryError::Failed { reason, attempts }) => {
                tracing::warn!(folder = %id, attempts, "Root lookup failed: {}", reason);
                Err(invalid(reason))
            }
            Err(RetryError::Aborted) => Err(ControlError::Terminal(self.control.state()).into()),
        }
    }
}

/// Holds the current session for a controller.
///
/// A new session is refused only while the current one is running or paused.
/// An idle session, such as one whose root was rejected, is replaced.
/// Commands are routed to whichever session is current.
#[derive(Default)]
pub struct SessionSlot {
    current: Mutex<Option<Arc<ExtractionSession>>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `session` unless the current one is running or paused.
    pub fn begin(
        &self,
        session: ExtractionSession,
    ) -> std::result::Result<Arc<ExtractionSession>, ControlError> {
        let mut current = self.current.lock();
        if current.as_ref().is_some_and(|s| s.state().is_active()) {
            return Err(ControlError::Busy);
        }
        let session = Arc::new(session);
        *current = Some(Arc::clone(&session));
        Ok(session)
    }

    pub fn current(&self) -> Option<Arc<ExtractionSession>> {
        self.current.lock().clone()
    }

    /// Progress of the current session, if any.
    pub fn progress(&self) -> Option<ProgressSnapshot> {
        self.current().map(|s| s.get_progress())
    }

    pub fn pause(&self) -> std::result::Result<(), ControlError> {
        self.with_current(ExtractionSession::request_pause)
    }

    pub fn resume(&self) -> std::result::Result<(), ControlError> {
        self.with_current(ExtractionSession::request_resume)
    }

    pub fn stop(&self) -> std::result::Result<(), ControlError> {
        self.with_current(ExtractionSession::request_stop)
    }

    fn with_current<F>(&self, command: F) -> std::result::Result<(), ControlError>
    where
        F: FnOnce(&ExtractionSession) -> std::result::Result<(), ControlError>,
    {
        match self.current() {
            Some(session) => command(&session),
            None => Err(ControlError::NotRunning),
        }
    }
}
