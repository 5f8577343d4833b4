//! Error types for metasniff
//!
//! The hierarchy mirrors how failures propagate through an extraction:
//! - [`FetchError`]: one failed request to the remote directory service.
//!   Classified as retryable, per-folder, or fatal for the whole session.
//! - [`ExtractError`]: session-level failures surfaced to the controller.
//! - [`ControlError`]: rejected operator commands (pause/resume/stop/start).
//! - [`ConfigError`]: invalid input caught before a session is created.

use crate::control::SessionState;
use thiserror::Error;

/// Result alias for session-level operations.
pub type Result<T, E = ExtractError> = std::result::Result<T, E>;

/// Failure of a single request to the remote directory service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network hiccup or rate limit; worth retrying
    #[error("Transient fetch failure: {0}")]
    Transient(String),

    /// Permission denied on one folder
    #[error("Access denied to folder '{folder_id}': {reason}")]
    AccessDenied { folder_id: String, reason: String },

    /// Folder does not exist (or was deleted mid-walk)
    #[error("Folder not found: '{0}'")]
    NotFound(String),

    /// Identifier refers to a file rather than a folder
    #[error("'{0}' is not a folder")]
    NotAFolder(String),

    /// Malformed response or cursor
    #[error("Unexpected response from directory service: {0}")]
    Protocol(String),

    /// Credentials revoked or expired
    #[error("{0}")]
    Auth(String),
}

impl FetchError {
    /// Check if the request should be retried with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }

    /// Check if this error must abort the whole session
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::Auth(_))
    }
}

/// Session-level failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Root folder missing or not a folder; raised before traversal starts
    #[error("Invalid root folder '{id}': {reason}")]
    InvalidRoot { id: String, reason: String },

    /// Credentials revoked mid-run; message kept verbatim
    #[error("Authorization failed: {0}")]
    FatalAuth(String),

    /// Session could not be started or was already used
    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    /// Worker pool could not be created
    #[error("Failed to build worker pool: {0}")]
    Pool(String),
}

/// Rejected operator command
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    /// Command needs a running or paused session
    #[error("No extraction is running")]
    NotRunning,

    /// Session reached a terminal state and cannot be reused
    #[error("Extraction already finished ({0})")]
    Terminal(SessionState),

    /// Session was already started once
    #[error("Extraction already started")]
    AlreadyStarted,

    /// Another session is still active in the slot
    #[error("Extraction already running")]
    Busy,
}

/// Configuration and CLI errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Retry policy needs at least one attempt
    #[error("Invalid retry attempts {0}: must be at least 1")]
    InvalidRetryAttempts(u32),

    /// Neither a bare folder id nor a recognised shared link
    #[error("Invalid folder ID or shared link format: '{0}'")]
    InvalidFolderReference(String),
}
