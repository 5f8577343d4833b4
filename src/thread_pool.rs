//! Worker pool construction for the traversal.
//!
//! Each session builds its own rayon pool sized to the configured worker
//! count rather than touching the global pool, so concurrent sessions in one
//! process (tests, embedders) never share or resize each other's workers.

use crate::config::MAX_WORKERS;
use crate::error::ExtractError;

/// Builds a pool with exactly `workers` threads named `metasniff-worker-N`.
///
/// # Errors
/// Returns [`ExtractError::Pool`] for a count outside `1..=MAX_WORKERS` or if
/// the threads cannot be spawned.
///
/// # Examples
/// ```rust
/// use metasniff::thread_pool::build_worker_pool;
///
/// let pool = build_worker_pool(2).unwrap();
/// assert_eq!(pool.current_num_threads(), 2);
/// ```
pub fn build_worker_pool(workers: usize) -> Result<rayon::ThreadPool, ExtractError> {
    if workers == 0 || workers > MAX_WORKERS {
        return Err(ExtractError::Pool(format!(
            "worker count {workers} outside 1..={MAX_WORKERS}"
        )));
    }

    if workers > 1 {
        tracing::warn!(
            workers,
            "Concurrent listing requests may hit remote rate limits; transient errors will be retried"
        );
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("metasniff-worker-{i}"))
        .build()
        .map_err(|e| ExtractError::Pool(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_has_requested_threads() {
        for n in 1..=MAX_WORKERS {
            let pool = build_worker_pool(n).unwrap();
            assert_eq!(pool.current_num_threads(), n);
        }
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(matches!(build_worker_pool(0), Err(ExtractError::Pool(_))));
        assert!(matches!(
            build_worker_pool(MAX_WORKERS + 1),
            Err(ExtractError::Pool(_))
        ));
    }

    #[test]
    fn test_threads_are_named() {
        let pool = build_worker_pool(1).unwrap();
        let name = pool.install(|| std::thread::current().name().map(str::to_string));
        assert_eq!(name.as_deref(), Some("metasniff-worker-0"));
    }
}
