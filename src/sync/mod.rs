//! Synchronisation benchmark.
//!
//! Each pattern is timed twice: a reference loop that only busy-waits for the
//! configured delay, then the same loop with the synchronisation primitive
//! after every delay. The difference of the two means is the cost of the
//! primitive.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::measurement::{delay, nanos, Timer};
use crate::result::SyncReport;
use crate::runtime::neighbours::{self, Topology};
use crate::runtime::Runtime;
use crate::statistics::{compute_stats, confidence_half_width, StatsResult, TimeSeries};

/// Synchronisation primitive and pattern under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncKind {
    /// Global barrier.
    All,
    /// `sync images` with the image half the team away.
    Pair,
    /// `sync images` with ring neighbours.
    Ring,
    /// `sync images` with neighbours on a random ring.
    Random,
    /// Acquire and release a lock owned by image 0.
    Lock,
    /// Enter and leave a critical section.
    Critical,
    /// No synchronisation; measures the loop itself.
    Null,
}

impl SyncKind {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            SyncKind::All => "sync all",
            SyncKind::Pair => "sync images pair",
            SyncKind::Ring => "sync images ring",
            SyncKind::Random => "sync images random",
            SyncKind::Lock => "lock",
            SyncKind::Critical => "critical",
            SyncKind::Null => "null",
        }
    }

    fn topology(self) -> Option<Topology> {
        match self {
            SyncKind::Pair => Some(Topology::Pair),
            SyncKind::Ring => Some(Topology::Ring),
            SyncKind::Random => Some(Topology::Random),
            _ => None,
        }
    }

    fn perform<R: Runtime>(self, rt: &R, neighs: &[usize]) {
        match self {
            SyncKind::All => rt.sync_all(),
            SyncKind::Pair | SyncKind::Ring | SyncKind::Random => rt.sync_images(neighs),
            SyncKind::Lock => rt.lock(0, || ()),
            SyncKind::Critical => rt.critical(|| ()),
            SyncKind::Null => {}
        }
    }
}

/// Time `outer_reps + 1` blocks of `inner_reps` iterations of `body`.
fn time_series<R, F>(rt: &R, config: &Config, mut body: F) -> Result<StatsResult>
where
    R: Runtime,
    F: FnMut(),
{
    let sync = &config.sync;
    let mut series = TimeSeries::with_outer_reps(sync.outer_reps);

    for _ in 0..=sync.outer_reps {
        rt.sync_all();
        let trial = Timer::time_block(sync.inner_reps, |_| {
            delay(sync.delay);
            body();
        });
        let slowest = rt.reduce_max(nanos(trial.elapsed));
        series.push(Duration::from_nanos(slowest));
    }

    compute_stats(&series, sync.outer_reps, config.stats_mode)
}

/// Measure one synchronisation pattern with `count` neighbours.
///
/// Collective: every image calls it with the same arguments. `seed` fixes the
/// random ring and must be equal on every image.
///
/// # Errors
///
/// `InvalidConfiguration` when the neighbour pattern does not fit the team or
/// the repetition counts are degenerate.
pub fn sync_bench<R: Runtime>(
    rt: &R,
    config: &Config,
    kind: SyncKind,
    count: usize,
    seed: u64,
) -> Result<SyncReport> {
    let neighs = match kind.topology() {
        Some(topology) => neighbours::neighbours(rt.this_image(), rt.num_images(), count, topology, seed)?,
        None => Vec::new(),
    };
    debug!(image = rt.this_image(), kind = kind.name(), ?neighs, "neighbours");

    let reference = time_series(rt, config, || {})?;
    let real = time_series(rt, config, || kind.perform(rt, &neighs))?;

    let inner = config.sync.inner_reps as f64;
    let sync_time_us = real.mean_us() - reference.mean_us();
    let error_us = confidence_half_width(real.std_dev_us, reference.std_dev_us);

    Ok(SyncReport {
        kind,
        neighbours: count,
        reference,
        real,
        sync_time_us,
        error_us,
        per_sync_us: sync_time_us / inner,
        per_sync_error_us: error_us / inner,
    })
}

/// Shared seed: `config.seed`, or one drawn by image 0 and broadcast.
pub fn shared_seed<R: Runtime>(rt: &R, config: &Config) -> u64 {
    match config.seed {
        Some(seed) => seed,
        None => {
            let mine = if rt.this_image() == 0 { rand::random() } else { 0 };
            rt.broadcast(mine, 0)
        }
    }
}

/// Run every synchronisation pattern that fits the team.
///
/// Order: sync all, pair, ring and random for 2, 4, ... neighbours up to
/// `min(max_neighbours, n - 2)`, lock, critical.
///
/// # Errors
///
/// `InvalidConfiguration` when `config` does not validate.
pub fn run<R: Runtime>(rt: &R, config: &Config) -> Result<Vec<SyncReport>> {
    config.validate()?;
    let me = rt.this_image();
    let n = rt.num_images();
    let seed = shared_seed(rt, config);

    let mut plan = vec![(SyncKind::All, 1)];
    if neighbours::pair_partner(me, n).is_some() {
        plan.push((SyncKind::Pair, 1));
    } else if me == 0 {
        warn!(images = n, "pair synchronisation needs an even image count, skipping");
    }
    let upper = config.sync.max_neighbours.min(n.saturating_sub(2));
    for count in (2..=upper).step_by(2) {
        plan.push((SyncKind::Ring, count));
        plan.push((SyncKind::Random, count));
    }
    plan.push((SyncKind::Lock, 1));
    plan.push((SyncKind::Critical, 1));

    let mut reports = Vec::with_capacity(plan.len());
    for (kind, count) in plan {
        if me == 0 {
            info!(kind = kind.name(), neighbours = count, "benchmarking synchronisation");
        }
        reports.push(sync_bench(rt, config, kind, count, seed)?);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(SyncKind::All.name(), "sync all");
        assert_eq!(SyncKind::Critical.name(), "critical");
    }

    #[test]
    fn test_only_image_patterns_have_topology() {
        assert_eq!(SyncKind::Ring.topology(), Some(Topology::Ring));
        assert_eq!(SyncKind::Lock.topology(), None);
        assert_eq!(SyncKind::All.topology(), None);
    }
}
