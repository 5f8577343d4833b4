//! Library crate for metasniff
//!
//! Forensic metadata extraction from a remote drive hierarchy: a paginated,
//! retrying traversal under operator pause/resume/stop control, with live
//! progress and a deterministic digest over the collected records.
//!
//! # Modules
//!
//! - [`session`]: One extraction run (`ExtractionSession`) and the `SessionSlot`
//! - [`scan`]: Traversal engine over a [`client::RemoteDirectoryClient`]
//! - [`control`]: Session state machine and worker checkpoints
//! - [`progress`]: Lock-protected progress counters and snapshots
//! - [`hash`]: Canonical record encoding and SHA-256 digest
//! - [`data`]: Remote entries, file records, folder nodes
//! - [`client`]: Directory client trait and the snapshot replay client
//! - [`config`]: Validated extraction settings and retry policy
//! - [`output`]: CSV, JSON and terminal renderers
//! - [`cli`], [`error`], [`metrics`], [`thread_pool`], [`utils`]

pub mod cli;
pub mod client;
pub mod config;
pub mod control;
pub mod data;
pub mod error;
pub mod hash;
pub mod metrics;
pub mod output;
pub mod progress;
pub mod scan;
pub mod session;
pub mod thread_pool;
pub mod utils;

pub use cli::Args;
pub use data::{FileRecord, RemoteEntry};
pub use session::{ExtractionReport, ExtractionSession, RunOutcome, SessionSlot};
