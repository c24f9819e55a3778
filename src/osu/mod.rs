//! OSU-style one-sided latency benchmarks.
//!
//! Unlike the ping-pong, these use fixed iteration counts: `skip` untimed
//! warm-up iterations, then `loops` timed ones, with smaller counts for
//! messages above a size threshold. Sizes run 0, 1, 2, 4, ... elements up to
//! the configured maximum.
//!
//! - [`get_latency`]: image 0 repeatedly gets a contiguous section from the
//!   last image while every other image waits.
//! - [`alloc_latency`]: every image repeatedly allocates and frees a
//!   symmetric array.

use tracing::{debug, info};

use crate::config::{Config, OsuConfig};
use crate::error::Result;
use crate::measurement::{black_box, nanos, Timer};
use crate::result::LatencyRow;
use crate::runtime::{Layout, Runtime, SymmetricArray};

/// Section sizes in elements: 0, then powers of two up to `max_elements`.
pub fn sizes(max_elements: usize) -> Vec<usize> {
    std::iter::once(0)
        .chain(std::iter::successors(Some(1usize), |&n| n.checked_mul(2)))
        .take_while(|&n| n <= max_elements)
        .collect()
}

impl OsuConfig {
    /// `(skip, loops)` for a section of `elements`.
    pub fn iterations(&self, elements: usize) -> (usize, usize) {
        if elements > self.large_elements {
            (self.skip_large, self.loops_large)
        } else {
            (self.skip, self.loops)
        }
    }
}

/// Time `skip + loops` runs of `op`, starting the clock after `skip`.
fn timed_loop(skip: usize, loops: usize, mut op: impl FnMut()) -> u64 {
    for _ in 0..skip {
        op();
    }
    let timer = Timer::start();
    for _ in 0..loops {
        op();
    }
    nanos(timer.elapsed())
}

/// One-sided get latency from image 0 to the last image.
///
/// Collective: every image allocates each size and waits at a barrier, and
/// every image gets image 0's rows back.
///
/// # Errors
///
/// `InvalidConfiguration` when `config` does not validate.
pub fn get_latency<R: Runtime>(rt: &R, config: &Config) -> Result<Vec<LatencyRow>> {
    config.validate()?;
    let osu = &config.osu;
    let me = rt.this_image();
    let target = rt.num_images() - 1;
    let mut scratch = Vec::new();
    let mut rows = Vec::new();

    for elements in sizes(osu.max_elements) {
        let (skip, loops) = osu.iterations(elements);
        let x = rt.allocate(elements);
        let layout = Layout::contiguous(elements);
        rt.sync_all();

        let mine = if me == 0 {
            timed_loop(skip, loops, || {
                x.get(target, &layout, &mut scratch);
                black_box(scratch.len());
            })
        } else {
            0
        };
        rt.sync_all();

        let total_ns = rt.broadcast(mine, 0);
        let row = LatencyRow::new(elements, loops, total_ns);
        debug!(elements, latency_us = row.latency_us, "get latency");
        rows.push(row);
    }

    Ok(rows)
}

/// Latency of allocating and freeing a symmetric array.
///
/// Collective: every image times its own allocations, and the slowest
/// image's time is reported.
///
/// # Errors
///
/// `InvalidConfiguration` when `config` does not validate.
pub fn alloc_latency<R: Runtime>(rt: &R, config: &Config) -> Result<Vec<LatencyRow>> {
    config.validate()?;
    let osu = &config.osu;
    let mut rows = Vec::new();

    for elements in sizes(osu.max_elements) {
        rt.sync_all();
        let mine = timed_loop(osu.skip_large, osu.loops_large, || {
            let x = rt.allocate(elements);
            black_box(x.len());
        });

        let total_ns = rt.reduce_max(mine);
        let row = LatencyRow::new(elements, osu.loops_large, total_ns);
        debug!(elements, latency_us = row.latency_us, "allocation latency");
        rows.push(row);
    }

    Ok(rows)
}

/// Run both latency benchmarks.
///
/// # Errors
///
/// As [`get_latency`].
pub fn run<R: Runtime>(rt: &R, config: &Config) -> Result<(Vec<LatencyRow>, Vec<LatencyRow>)> {
    if rt.this_image() == 0 {
        info!(image = rt.num_images() - 1, "benchmarking get latency");
    }
    let get = get_latency(rt, config)?;
    if rt.this_image() == 0 {
        info!("benchmarking allocation latency");
    }
    let alloc = alloc_latency(rt, config)?;
    Ok((get, alloc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_start_at_zero() {
        assert_eq!(sizes(8), vec![0, 1, 2, 4, 8]);
        assert_eq!(sizes(6), vec![0, 1, 2, 4]);
        assert_eq!(sizes(0), vec![0]);
    }

    #[test]
    fn test_large_sections_use_fewer_iterations() {
        let osu = OsuConfig::default();
        assert_eq!(osu.iterations(osu.large_elements), (osu.skip, osu.loops));
        assert_eq!(osu.iterations(osu.large_elements + 1), (osu.skip_large, osu.loops_large));
    }
}
