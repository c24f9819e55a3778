//! Report types produced by the benchmark drivers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pt2pt::{Mode, Pairing, SyncMode};
use crate::runtime::Layout;
use crate::sort::{KeyDistribution, SortBackend};
use crate::statistics::StatsResult;
use crate::sync::SyncKind;

/// Everything measured in one run, as seen from image 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchReport {
    /// Images taking part in the run.
    pub num_images: usize,

    /// Smallest observable step of the monotonic clock, in nanoseconds.
    pub timer_resolution_ns: u64,

    /// One report per pairing, sync mode and transfer mode.
    pub pingpong: Vec<PingPongReport>,

    /// One report per synchronisation pattern.
    pub sync: Vec<SyncReport>,

    /// One report per sort backend.
    pub sort: Vec<SortReport>,

    /// Get latency from image 0 to the last image, per section size.
    #[serde(default)]
    pub get_latency: Vec<LatencyRow>,

    /// Symmetric allocation latency, per section size.
    #[serde(default)]
    pub alloc_latency: Vec<LatencyRow>,
}

/// Size sweep of one transfer mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingPongReport {
    /// Which images were paired.
    pub pairing: Pairing,

    /// Transfer variant.
    pub mode: Mode,

    /// Synchronisation between ping and pong.
    pub sync: SyncMode,

    /// Sender of the pair image 0 belongs to.
    pub image1: usize,

    /// Receiver of the pair image 0 belongs to.
    pub image2: usize,

    /// Whether transferred data was checked on every round trip.
    pub checked: bool,

    /// `false` if a check failed; the sweep stopped at that size.
    pub verified: bool,

    /// One row per section size, in sweep order.
    pub rows: Vec<PingPongRow>,
}

/// One measured section size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PingPongRow {
    /// Number of blocks.
    pub count: usize,

    /// Elements per block.
    pub blksize: usize,

    /// Distance between block starts.
    pub stride: usize,

    /// Elements transferred each way.
    pub ndata: usize,

    /// Span of the section in elements.
    pub nextent: usize,

    /// Round trips per accepted timed block.
    pub nrep: usize,

    /// Mean round-trip time in microseconds.
    pub time_us: f64,

    /// One-way latency (half the round trip) in microseconds.
    pub latency_us: f64,

    /// One-way bandwidth in MiB/s.
    pub bandwidth_mib_s: f64,

    /// Standard deviation of the round-trip time in microseconds.
    pub std_dev_us: f64,

    /// Outlying samples.
    pub outliers: usize,
}

impl PingPongRow {
    /// Bytes per element of the transferred arrays.
    pub const ELEMENT_BYTES: usize = std::mem::size_of::<f64>();

    pub(crate) fn new(layout: &Layout, nrep: usize, stats: &StatsResult) -> Self {
        let ndata = layout.ndata();
        let time_us = stats.mean_us();
        let latency_us = time_us / 2.0;
        let bandwidth_mib_s = if latency_us > 0.0 {
            (ndata * Self::ELEMENT_BYTES) as f64 / (latency_us * 1e-6) / (1024.0 * 1024.0)
        } else {
            0.0
        };
        Self {
            count: layout.count,
            blksize: layout.blksize,
            stride: layout.stride,
            ndata,
            nextent: layout.extent(),
            nrep,
            time_us,
            latency_us,
            bandwidth_mib_s,
            std_dev_us: stats.std_dev_us,
            outliers: stats.outliers,
        }
    }
}

/// Cost of one synchronisation pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Synchronisation primitive and pattern.
    pub kind: SyncKind,

    /// Neighbours per image (1 for non-neighbour patterns).
    pub neighbours: usize,

    /// Delay-only loop.
    pub reference: StatsResult,

    /// Delay plus synchronisation loop.
    pub real: StatsResult,

    /// `real - reference` per outer iteration, in microseconds. May be negative.
    pub sync_time_us: f64,

    /// 95% half-width of `sync_time_us`.
    pub error_us: f64,

    /// `sync_time_us` per synchronisation.
    pub per_sync_us: f64,

    /// `error_us` per synchronisation.
    pub per_sync_error_us: f64,
}

/// Timings of one sort backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortReport {
    /// Sort implementation.
    pub backend: SortBackend,

    /// Input key distribution.
    pub distribution: KeyDistribution,

    /// Keys per iteration.
    pub elements: usize,

    /// Worker threads in the pool.
    pub threads: usize,

    /// Size of the key array in MiB.
    pub megabytes: f64,

    /// Per-iteration sort times, warm-up first.
    pub times: Vec<Duration>,

    /// Summary of `times`.
    pub stats: StatsResult,
}

/// One size of a fixed-iteration latency benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyRow {
    /// Elements per operation.
    pub elements: usize,

    /// Bytes per operation.
    pub bytes: usize,

    /// Timed iterations.
    pub iterations: usize,

    /// Mean time per operation in microseconds.
    pub latency_us: f64,
}

impl LatencyRow {
    pub(crate) fn new(elements: usize, iterations: usize, total_ns: u64) -> Self {
        let latency_us = if iterations > 0 {
            total_ns as f64 / 1e3 / iterations as f64
        } else {
            0.0
        };
        Self {
            elements,
            bytes: elements * std::mem::size_of::<f64>(),
            iterations,
            latency_us,
        }
    }
}
