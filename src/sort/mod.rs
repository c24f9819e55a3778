//! Shared-memory sort benchmark.
//!
//! Every iteration regenerates the keys, checksums them, sorts them inside a
//! dedicated worker pool, then checks that the checksum is unchanged and the
//! keys are in order. Iteration 0 is a warm-up.

mod keys;
mod pool;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::measurement::Timer;
use crate::result::SortReport;
use crate::statistics::{compute_stats, TimeSeries};

pub use keys::{checksum, counter_seed, first_unordered, generate, KeyDistribution};

/// Sort implementation under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBackend {
    /// `rayon` parallel unstable sort.
    ParallelUnstable,
    /// `rayon` parallel stable merge sort.
    ParallelStable,
    /// Single-threaded unstable sort.
    Sequential,
}

impl SortBackend {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            SortBackend::ParallelUnstable => "parallel unstable",
            SortBackend::ParallelStable => "parallel stable",
            SortBackend::Sequential => "sequential",
        }
    }

    fn sort(self, keys: &mut [i64]) {
        match self {
            SortBackend::ParallelUnstable => keys.par_sort_unstable(),
            SortBackend::ParallelStable => keys.par_sort(),
            SortBackend::Sequential => keys.sort_unstable(),
        }
    }
}

/// Time `config.sort.iterations` sorts (plus one warm-up) with `backend`.
///
/// # Errors
///
/// `Verification` when a sort loses keys or leaves them out of order,
/// `ThreadPool` when the workers cannot be spawned, `InvalidConfiguration`
/// for fewer than 2 iterations.
pub fn sort_bench(config: &Config, backend: SortBackend, seed: u64) -> Result<SortReport> {
    let sort = &config.sort;
    let pool = pool::build(sort.threads)?;
    let threads = pool.current_num_threads();
    let mut keys = vec![0i64; sort.elements];
    let mut series = TimeSeries::with_outer_reps(sort.iterations);

    for iteration in 0..=sort.iterations {
        let iteration_seed = counter_seed(seed, iteration as u64);
        pool.install(|| generate(&mut keys, sort.distribution, iteration_seed));
        let before = pool.install(|| checksum(&keys));

        let timer = Timer::start();
        pool.install(|| backend.sort(&mut keys));
        let elapsed = timer.elapsed();

        let after = pool.install(|| checksum(&keys));
        if before != after {
            return Err(Error::Verification(format!(
                "{} sort changed the checksum from {} to {}",
                backend.name(),
                before,
                after
            )));
        }
        if let Some(index) = pool.install(|| first_unordered(&keys)) {
            return Err(Error::Verification(format!(
                "{} sort left key {} at index {} after {}",
                backend.name(),
                keys[index],
                index,
                keys[index - 1]
            )));
        }

        debug!(backend = backend.name(), iteration, elapsed_ms = elapsed.as_secs_f64() * 1e3, "sorted");
        series.push(elapsed);
    }

    let stats = compute_stats(&series, sort.iterations, config.stats_mode)?;
    Ok(SortReport {
        backend,
        distribution: sort.distribution,
        elements: sort.elements,
        threads,
        megabytes: (sort.elements * std::mem::size_of::<i64>()) as f64 / (1024.0 * 1024.0),
        times: series.as_slice().to_vec(),
        stats,
    })
}

/// Run every configured backend on the same key sequence.
///
/// # Errors
///
/// As [`sort_bench`], plus `InvalidConfiguration` when `config` does not
/// validate.
pub fn run(config: &Config) -> Result<Vec<SortReport>> {
    config.validate()?;
    let seed = config.seed.unwrap_or_else(rand::random);

    config
        .sort
        .backends
        .iter()
        .map(|&backend| {
            info!(
                backend = backend.name(),
                distribution = config.sort.distribution.name(),
                elements = config.sort.elements,
                "benchmarking sort"
            );
            sort_bench(config, backend, seed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backends_sort() {
        for backend in [SortBackend::ParallelUnstable, SortBackend::ParallelStable, SortBackend::Sequential] {
            let mut keys = vec![3, -1, 2, 2, 0];
            backend.sort(&mut keys);
            assert_eq!(keys, vec![-1, 0, 2, 2, 3], "{}", backend.name());
        }
    }
}
