//! CLI interface definitions for the `metasniff` application.
//!
//! This module defines command-line arguments using [`clap`] and exposes:
//!
//! - [`Args`]: the main struct parsed from CLI inputs
//! - [`OutputFormat`]: which report files to write
//!
//! # Example
//!
//! ```bash
//! metasniff --snapshot listing.json \
//!     --folder-id "https://drive.google.com/drive/folders/1AbC?usp=sharing" \
//!     --workers 2 --format csv --output case-042
//! ```

use crate::config::{DEFAULT_PAGE_SIZE, DEFAULT_WORKERS};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for the `metasniff` metadata extractor.
///
/// # Examples
///
/// ```rust
/// use metasniff::Args;
/// use clap::Parser;
///
/// let args = Args::parse_from(["metasniff", "--snapshot", "listing.json", "-w", "2"]);
/// assert_eq!(args.workers, 2);
/// assert!(args.folder_id.is_none());
/// ```
#[derive(Parser, Debug, Clone)]
#[command(name = "metasniff", author = "Sam Green", version, about)]
pub struct Args {
    /// Folder ID or shared folder link to extract (default: the whole account)
    #[arg(short = 'f', long, value_name = "ID_OR_LINK")]
    pub folder_id: Option<String>,

    /// Include files that are in the trash
    #[arg(long, default_value_t = false)]
    pub include_trashed: bool,

    /// Number of concurrent workers (1-4). One is the most reliable.
    #[arg(short = 'w', long, value_name = "N", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Recorded files listing (JSON, `{"files": [...]}`) to extract from
    #[arg(long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Children requested per listing page
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Retries for a transient fetch failure before the folder is marked failed
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub max_retries: u32,

    /// Initial retry delay in milliseconds; doubles on each further retry
    #[arg(long, value_name = "MS", default_value_t = 500)]
    pub retry_delay_ms: u64,

    /// Base name for report files (extensions are added per format)
    #[arg(short = 'o', long, value_name = "BASE")]
    pub output: Option<String>,

    /// Which report files to write
    #[arg(long, value_enum, default_value_t = OutputFormat::All)]
    pub format: OutputFormat,

    /// Read pause/resume/stop commands from stdin while extracting
    #[arg(long, default_value_t = false)]
    pub interactive: bool,

    /// Enable performance profiling and show timing summary
    #[arg(long, default_value_t = false)]
    pub profile: bool,

    /// Verbose logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Report files to produce.
///
/// # Variants
/// * `All` - CSV and JSON
/// * `Csv` - CSV only
/// * `Json` - JSON only
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum OutputFormat {
    All,
    Csv,
    Json,
}

impl OutputFormat {
    pub fn wants_csv(&self) -> bool {
        matches!(self, OutputFormat::All | OutputFormat::Csv)
    }

    pub fn wants_json(&self) -> bool {
        matches!(self, OutputFormat::All | OutputFormat::Json)
    }
}
