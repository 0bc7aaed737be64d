//! Rayon pool used for per-file backend analysis.
//!
//! Analysis is embarrassingly parallel (the only shared state is the
//! read-mostly repository-root cache), so the batch runs on one bounded
//! pool sized from `performance.parallel_threads`.

use once_cell::sync::OnceCell;
use rayon::ThreadPoolBuilder;
use std::sync::Arc;

static POOL: OnceCell<Arc<rayon::ThreadPool>> = OnceCell::new();

/// Builds a pool with `threads` workers (or a CPU-derived default for 0).
fn build_pool(threads: usize) -> anyhow::Result<Arc<rayon::ThreadPool>> {
    let threads = if threads == 0 {
        default_threads()
    } else {
        threads
    };
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("recap-worker-{i}"))
        .build()?;
    Ok(Arc::new(pool))
}

/// Sizes and installs the analysis pool from the run configuration.
///
/// # Errors
///
/// Returns an error if the pool was already configured or cannot be built.
pub fn configure_from_config(config: &crate::config::Config) -> anyhow::Result<()> {
    let pool = build_pool(config.performance.parallel_threads)?;
    POOL.set(pool)
        .map_err(|_| anyhow::anyhow!("Analysis pool already configured"))
}

/// Runs `f` on the analysis pool, building a default-sized pool on first
/// use when none was configured.
///
/// # Panics
///
/// Panics if the fallback pool cannot be created.
pub fn run_in_pool<F, R>(f: F) -> R
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    let pool = POOL
        .get_or_init(|| build_pool(0).expect("Failed to create analysis pool"))
        .clone();
    pool.install(f)
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
        .min(8)
}
