//! Extraction configuration.
//!
//! [`ExtractionConfig`] carries everything a session needs besides the client:
//! the root to walk, the trash filter, the worker count, and the retry policy
//! for transient fetch failures. It is validated once, before the session is
//! created, and never changes afterwards.

use crate::cli::Args;
use crate::error::ConfigError;
use crate::utils::normalize_folder_reference;
use std::time::Duration;

/// Upper bound on concurrent workers.
pub const MAX_WORKERS: usize = 4;

/// Workers used when none are requested. Sequential is the safe choice with
/// a shared remote client.
pub const DEFAULT_WORKERS: usize = 1;

/// Children requested per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Path label used for the top of the hierarchy when walking the whole account.
pub const ACCOUNT_ROOT_LABEL: &str = "Root";

/// Bounded exponential backoff for transient fetch failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries per request, including the first
    pub max_attempts: u32,
    /// Delay after the first failure; doubles after each further one
    pub base_delay: Duration,
    /// Cap on a single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Retries without sleeping. Used by tests and offline replays.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based count of failures so far).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidRetryAttempts(self.max_attempts));
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

/// Settings for one extraction session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Bare folder id; `None` walks the whole account
    pub root_folder_id: Option<String>,
    pub include_trashed: bool,
    pub worker_count: usize,
    pub retry: RetryPolicy,
}

impl ExtractionConfig {
    /// Defaults for the given root: trash excluded, one worker.
    pub fn new(root_folder_id: Option<String>) -> Self {
        Self {
            root_folder_id,
            include_trashed: false,
            worker_count: DEFAULT_WORKERS,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_include_trashed(mut self, include_trashed: bool) -> Self {
        self.include_trashed = include_trashed;
        self
    }

    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 || self.worker_count > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: self.worker_count,
                max: MAX_WORKERS,
            });
        }
        self.retry.validate()
    }
}

impl TryFrom<&Args> for ExtractionConfig {
    type Error = ConfigError;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let root_folder_id = match args.folder_id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(normalize_folder_reference(raw)?),
            _ => None,
        };

        let config = ExtractionConfig::new(root_folder_id)
            .with_include_trashed(args.include_trashed)
            .with_workers(args.workers)
            .with_retry(RetryPolicy {
                max_attempts: args.max_retries.saturating_add(1),
                base_delay: Duration::from_millis(args.retry_delay_ms),
                ..RetryPolicy::default()
            });

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for(4), Duration::from_millis(500));
        assert_eq!(policy.delay_for(40), Duration::from_millis(500));
    }

    #[test]
    fn test_immediate_policy_never_sleeps() {
        let policy = RetryPolicy::immediate(3);
        assert_eq!(policy.delay_for(1), Duration::ZERO);
        assert_eq!(policy.delay_for(3), Duration::ZERO);
    }

    #[test]
    fn test_worker_bounds() {
        assert!(ExtractionConfig::new(None).validate().is_ok());
        assert!(ExtractionConfig::new(None).with_workers(4).validate().is_ok());
        assert_eq!(
            ExtractionConfig::new(None).with_workers(0).validate(),
            Err(ConfigError::InvalidWorkerCount { count: 0, max: 4 })
        );
        assert_eq!(
            ExtractionConfig::new(None).with_workers(5).validate(),
            Err(ConfigError::InvalidWorkerCount { count: 5, max: 4 })
        );
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = ExtractionConfig::new(None).with_retry(RetryPolicy::immediate(0));
        assert_eq!(config.validate(), Err(ConfigError::InvalidRetryAttempts(0)));
    }

    #[test]
    fn test_defaults() {
        let config = ExtractionConfig::new(Some("abc".into()));
        assert!(!config.include_trashed);
        assert_eq!(config.worker_count, DEFAULT_WORKERS);
        assert_eq!(config.retry, RetryPolicy::default());
    }
}
