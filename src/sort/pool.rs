//! Worker pool for the sort benchmark.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::Result;

/// Stack size of every worker thread.
const STACK_SIZE: usize = 8 * 1024 * 1024;

/// Build a pool with `threads` workers, or one per logical CPU.
///
/// # Errors
///
/// `ThreadPool` when the operating system refuses to spawn the workers.
pub fn build(threads: Option<usize>) -> Result<ThreadPool> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads.unwrap_or(0))
        .stack_size(STACK_SIZE)
        .thread_name(|i| format!("cafbench-sort-{}", i))
        .build()?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_threads() {
        let pool = build(Some(3)).unwrap();
        assert_eq!(pool.current_num_threads(), 3);
        assert_eq!(pool.install(rayon::current_num_threads), 3);
    }
}
