//! Phase timing for `--profile` runs.
//!
//! This module provides:
//! - [`PhaseTimer`] - A wrapper around `Instant` for timing different phases
//! - [`ProfileData`] - Collected phase timings plus free-form metadata
//! - [`print_profile_summary`] - Terminal output for profiling results
//! - [`time_phase!`](crate::time_phase) - Times a block and returns its value
//!
//! # Usage
//!
//! ```rust
//! use metasniff::metrics::{PhaseTimer, ProfileData};
//!
//! let mut profile = ProfileData::new();
//! let timer = PhaseTimer::new("Traversal");
//!
//! // ... do work ...
//!
//! profile.add_phase(timer.finish());
//! assert_eq!(profile.phases.len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// A timer for measuring the duration of a specific phase or operation.
#[derive(Debug, Clone)]
pub struct PhaseTimer {
    /// The name of the phase being timed
    pub name: String,
    /// The start time of the phase
    pub start: Instant,
}

impl PhaseTimer {
    /// Creates a new timer and starts timing the specified phase.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }

    /// Finishes timing the phase and returns the elapsed duration.
    pub fn finish(self) -> PhaseResult {
        PhaseResult {
            name: self.name,
            duration: self.start.elapsed(),
        }
    }
}

/// The result of a completed phase timing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub name: String,
    /// Serialized as whole milliseconds
    #[serde(with = "duration_serde", rename = "duration_ms")]
    pub duration: Duration,
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Timings collected over one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileData {
    pub phases: Vec<PhaseResult>,
    /// Additional metadata, printed in key order
    pub metadata: BTreeMap<String, String>,
}

impl ProfileData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_phase(&mut self, phase: PhaseResult) {
        self.phases.push(phase);
    }

    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    /// Gets the total duration of all phases combined.
    pub fn total_duration(&self) -> Duration {
        self.phases.iter().map(|p| p.duration).sum()
    }
}

/// Writes a formatted profile summary.
///
/// # Example Output
/// ```text
/// Extraction phase timings
///   Traversal           812 ms
///   Hashing               3 ms
///   Export               14 ms
///   Total               829 ms
/// ```
pub fn write_profile_summary<W: Write>(out: &mut W, profile: &ProfileData) -> io::Result<()> {
    writeln!(out, "\nExtraction phase timings")?;

    for phase in &profile.phases {
        writeln!(out, "  {:<15} {:>7} ms", phase.name, phase.duration.as_millis())?;
    }
    writeln!(
        out,
        "  {:<15} {:>7} ms",
        "Total",
        profile.total_duration().as_millis()
    )?;

    if !profile.metadata.is_empty() {
        writeln!(out, "\nAdditional metrics:")?;
        for (key, value) in &profile.metadata {
            writeln!(out, "  {:<15} {}", key, value)?;
        }
    }

    writeln!(out)
}

/// Prints the profile summary to stdout.
pub fn print_profile_summary(profile: &ProfileData) {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    if let Err(e) = write_profile_summary(&mut lock, profile) {
        tracing::warn!("Failed to print profile summary: {}", e);
    }
}

/// A convenience macro for timing a block of code.
///
/// Returns `(result, PhaseResult)`.
///
/// # Example
/// ```rust
/// use metasniff::time_phase;
///
/// let (result, timing) = time_phase!("Hashing", {
///     // ... some expensive operation ...
///     42
/// });
/// assert_eq!(result, 42);
/// assert_eq!(timing.name, "Hashing");
/// ```
#[macro_export]
macro_rules! time_phase {
    ($name:expr, $code:block) => {{
        let timer = $crate::metrics::PhaseTimer::new($name);
        let result = $code;
        let timing = timer.finish();
        (result, timing)
    }};
}
