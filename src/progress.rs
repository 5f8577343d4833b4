//! Progress counters for a running extraction.
//!
//! Workers bump counters after each unit of work (folder entered, folder
//! scanned, file emitted). Viewers poll [`ProgressTracker::snapshot`] for a
//! consistent copy. All reads and writes go through one `RwLock`, so a reader
//! never sees half of an update or half of a reset.
//!
//! Stopping a session zeroes the counters and freezes the tracker in the same
//! critical section as the state change (see [`ProgressTracker::reset_on`]).
//! Late updates from workers finishing an in-flight request are then ignored.

use crate::control::SessionState;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Default)]
struct Counters {
    folders_scanned: u64,
    folders_failed: u64,
    files_found: u64,
    bytes_processed: u64,
    current_path: Option<String>,
    started_at: Option<DateTime<Utc>>,
    started: Option<Instant>,
    finished: Option<Instant>,
}

#[derive(Debug, Default)]
struct Inner {
    counters: Counters,
    frozen: bool,
}

/// Read-only copy of the counters handed to viewers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub state: SessionState,
    pub folders_scanned: u64,
    pub folders_failed: u64,
    pub files_found: u64,
    pub bytes_processed: u64,
    pub current_path: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: f64,
}

impl ProgressSnapshot {
    /// True when every counter is at its reset value.
    pub fn is_zeroed(&self) -> bool {
        self.folders_scanned == 0
            && self.folders_failed == 0
            && self.files_found == 0
            && self.bytes_processed == 0
            && self.current_path.is_none()
            && self.started_at.is_none()
            && self.elapsed_seconds == 0.0
    }

    /// Files found per second of elapsed time.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed_seconds > 0.0 {
            self.files_found as f64 / self.elapsed_seconds
        } else {
            0.0
        }
    }
}

/// Session-scoped progress counters.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    inner: RwLock<Inner>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the run start time.
    pub fn mark_started(&self) {
        self.update(|c| {
            c.started_at = Some(Utc::now());
            c.started = Some(Instant::now());
        });
    }

    /// Freezes `elapsed_seconds` at the current time.
    pub fn mark_finished(&self) {
        self.update(|c| c.finished = Some(Instant::now()));
    }

    pub fn enter_folder(&self, path: &str) {
        self.update(|c| c.current_path = Some(path.to_string()));
    }

    pub fn folder_scanned(&self) {
        self.update(|c| c.folders_scanned += 1);
    }

    pub fn folder_failed(&self) {
        self.update(|c| c.folders_failed += 1);
    }

    /// Counts one emitted file and adds its size when known.
    pub fn file_found(&self, size: Option<u64>) {
        self.update(|c| {
            c.files_found += 1;
            c.bytes_processed += size.unwrap_or(0);
        });
    }

    /// Consistent copy of the counters. `state` is evaluated while the read
    /// lock is held so it cannot disagree with a concurrent reset.
    pub fn snapshot<F>(&self, state: F) -> ProgressSnapshot
    where
        F: FnOnce() -> SessionState,
    {
        let inner = self.inner.read();
        let c = &inner.counters;
        let elapsed_seconds = match (c.started, c.finished) {
            (Some(start), Some(end)) => end.duration_since(start).as_secs_f64(),
            (Some(start), None) => start.elapsed().as_secs_f64(),
            _ => 0.0,
        };

        ProgressSnapshot {
            state: state(),
            folders_scanned: c.folders_scanned,
            folders_failed: c.folders_failed,
            files_found: c.files_found,
            bytes_processed: c.bytes_processed,
            current_path: c.current_path.clone(),
            started_at: c.started_at,
            elapsed_seconds,
        }
    }

    /// Runs `transition` under the write lock and, if it succeeds, zeroes all
    /// counters and ignores further updates.
    pub fn reset_on<T, E, F>(&self, transition: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let mut inner = self.inner.write();
        let out = transition()?;
        inner.counters = Counters::default();
        inner.frozen = true;
        Ok(out)
    }

    fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut Counters),
    {
        let mut inner = self.inner.write();
        if !inner.frozen {
            apply(&mut inner.counters);
        }
    }
}
