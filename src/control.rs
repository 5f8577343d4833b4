//! Pause/resume/stop control for a running extraction.
//!
//! The [`ControlPlane`] owns the session state machine:
//!
//! ```text
//! Idle ──fail──▶ Failed   (authorization rejected during the root lookup)
//! Idle ──start──▶ Running ──pause──▶ Paused
//!                  │  ▲               │
//!                  │  └────resume─────┤
//!                  │                  │
//!                  ├──stop──▶ Stopped ◀┘
//!                  ├──complete──▶ Completed
//!                  └──fail──▶ Failed
//! ```
//!
//! Operator commands only flip the state and wake waiters. Workers observe the
//! state at checkpoints via [`ControlPlane::checkpoint`], which re-reads it
//! under the lock on every call and blocks while paused.

use crate::error::ControlError;
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use std::fmt;

/// Lifecycle state of an extraction session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Paused => "paused",
            SessionState::Completed => "completed",
            SessionState::Stopped => "stopped",
            SessionState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Stopped | SessionState::Failed
        )
    }

    /// Running or paused.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Running | SessionState::Paused)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a worker should do after a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    Continue,
    Abort,
}

/// Shared state machine polled by traversal workers.
#[derive(Debug)]
pub struct ControlPlane {
    state: Mutex<SessionState>,
    changed: Condvar,
}

impl ControlPlane {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SessionState::Idle),
            changed: Condvar::new(),
        }
    }

    /// Current state (fresh read).
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Fails unless the session has never been started.
    pub fn ensure_idle(&self) -> Result<(), ControlError> {
        match self.state() {
            SessionState::Idle => Ok(()),
            s if s.is_terminal() => Err(ControlError::Terminal(s)),
            _ => Err(ControlError::AlreadyStarted),
        }
    }

    /// `Idle → Running`. A session is started at most once.
    pub fn start(&self) -> Result<(), ControlError> {
        self.transition(|state| match state {
            SessionState::Idle => Ok(SessionState::Running),
            s if s.is_terminal() => Err(ControlError::Terminal(s)),
            _ => Err(ControlError::AlreadyStarted),
        })
    }

    /// `Running → Paused`; already paused is a no-op.
    pub fn request_pause(&self) -> Result<(), ControlError> {
        self.transition(|state| match state {
            SessionState::Running | SessionState::Paused => Ok(SessionState::Paused),
            SessionState::Idle => Err(ControlError::NotRunning),
            s => Err(ControlError::Terminal(s)),
        })
    }

    /// `Paused → Running`; already running is a no-op.
    pub fn request_resume(&self) -> Result<(), ControlError> {
        self.transition(|state| match state {
            SessionState::Running | SessionState::Paused => Ok(SessionState::Running),
            SessionState::Idle => Err(ControlError::NotRunning),
            s => Err(ControlError::Terminal(s)),
        })
    }

    /// `Running | Paused → Stopped`; already stopped is a no-op.
    pub fn request_stop(&self) -> Result<(), ControlError> {
        self.transition(|state| match state {
            SessionState::Running | SessionState::Paused | SessionState::Stopped => {
                Ok(SessionState::Stopped)
            }
            SessionState::Idle => Err(ControlError::NotRunning),
            s => Err(ControlError::Terminal(s)),
        })
    }

    /// Marks the walk finished. Returns the resulting state, which stays
    /// `Stopped` or `Failed` if either won the race.
    pub fn complete(&self) -> SessionState {
        self.settle(SessionState::Completed)
    }

    /// Moves any non-terminal state to `Failed`.
    pub fn fail(&self) -> SessionState {
        self.settle(SessionState::Failed)
    }

    /// Blocks while paused. Returns [`Checkpoint::Abort`] once the session is
    /// in a terminal state.
    pub fn checkpoint(&self) -> Checkpoint {
        let mut state = self.state.lock();
        loop {
            match *state {
                SessionState::Paused => self.changed.wait(&mut state),
                SessionState::Idle | SessionState::Running => return Checkpoint::Continue,
                _ => return Checkpoint::Abort,
            }
        }
    }

    fn transition<F>(&self, next: F) -> Result<(), ControlError>
    where
        F: FnOnce(SessionState) -> Result<SessionState, ControlError>,
    {
        let mut state = self.state.lock();
        let current = *state;
        let target = next(current)?;
        if current != target {
            tracing::debug!(from = %current, to = %target, "session state change");
            *state = target;
            self.changed.notify_all();
        }
        Ok(())
    }

    fn settle(&self, target: SessionState) -> SessionState {
        let mut state = self.state.lock();
        let current = *state;
        if !current.is_terminal() {
            tracing::debug!(from = %current, to = %target, "session state change");
            *state = target;
            self.changed.notify_all();
        }
        *state
    }
}

impl Default for ControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_happy_path_transitions() {
        let control = ControlPlane::new();
        assert_eq!(control.state(), SessionState::Idle);

        control.start().unwrap();
        control.request_pause().unwrap();
        assert_eq!(control.state(), SessionState::Paused);
        control.request_resume().unwrap();
        assert_eq!(control.state(), SessionState::Running);
        assert_eq!(control.complete(), SessionState::Completed);
    }

    #[test]
    fn test_commands_are_idempotent() {
        let control = ControlPlane::new();
        control.start().unwrap();

        control.request_pause().unwrap();
        control.request_pause().unwrap();
        assert_eq!(control.state(), SessionState::Paused);

        control.request_resume().unwrap();
        control.request_resume().unwrap();
        assert_eq!(control.state(), SessionState::Running);

        control.request_stop().unwrap();
        control.request_stop().unwrap();
        assert_eq!(control.state(), SessionState::Stopped);
    }

    #[test]
    fn test_idle_rejects_commands() {
        let control = ControlPlane::new();
        assert_eq!(control.request_pause(), Err(ControlError::NotRunning));
        assert_eq!(control.request_resume(), Err(ControlError::NotRunning));
        assert_eq!(control.request_stop(), Err(ControlError::NotRunning));
        assert_eq!(control.state(), SessionState::Idle);
    }

    #[test]
    fn test_stop_is_terminal() {
        let control = ControlPlane::new();
        control.start().unwrap();
        control.request_stop().unwrap();

        assert_eq!(
            control.start(),
            Err(ControlError::Terminal(SessionState::Stopped))
        );
        assert_eq!(
            control.request_resume(),
            Err(ControlError::Terminal(SessionState::Stopped))
        );
        assert_eq!(control.complete(), SessionState::Stopped);
        assert_eq!(control.fail(), SessionState::Stopped);
        assert_eq!(control.checkpoint(), Checkpoint::Abort);
    }

    #[test]
    fn test_start_only_once() {
        let control = ControlPlane::new();
        control.start().unwrap();
        assert_eq!(control.start(), Err(ControlError::AlreadyStarted));
        assert_eq!(control.ensure_idle(), Err(ControlError::AlreadyStarted));
    }

    #[test]
    fn test_completed_rejects_stop() {
        let control = ControlPlane::new();
        control.start().unwrap();
        control.complete();
        assert_eq!(
            control.request_stop(),
            Err(ControlError::Terminal(SessionState::Completed))
        );
    }

    #[test]
    fn test_checkpoint_blocks_while_paused() {
        let control = Arc::new(ControlPlane::new());
        control.start().unwrap();
        control.request_pause().unwrap();

        let worker = {
            let control = Arc::clone(&control);
            thread::spawn(move || control.checkpoint())
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!worker.is_finished(), "checkpoint returned while paused");

        control.request_resume().unwrap();
        assert_eq!(worker.join().unwrap(), Checkpoint::Continue);
    }

    #[test]
    fn test_stop_wakes_paused_checkpoint() {
        let control = Arc::new(ControlPlane::new());
        control.start().unwrap();
        control.request_pause().unwrap();

        let worker = {
            let control = Arc::clone(&control);
            thread::spawn(move || control.checkpoint())
        };

        thread::sleep(Duration::from_millis(20));
        control.request_stop().unwrap();
        assert_eq!(worker.join().unwrap(), Checkpoint::Abort);
    }
}
