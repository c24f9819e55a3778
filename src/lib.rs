//! # cafbench
//!
//! Micro-benchmarks for one-sided (PGAS) communication, synchronisation and
//! parallel sorting.
//!
//! Alongside the adaptive benchmarks, [`osu`] runs fixed-iteration get and
//! allocation latency sweeps.
//!
//! Every measurement follows the same pipeline:
//! - an adaptive repetition controller grows the number of inner repetitions
//!   until one timed block lasts about the target time, and rejects blocks
//!   that overshoot it by more than a third
//! - `outer_reps + 1` accepted blocks form a time series whose first entry is
//!   a warm-up
//! - the series is summarised by its mean, standard deviation and the number
//!   of samples more than three standard deviations off
//!
//! The drivers are written against the [`runtime::Runtime`] trait and run on
//! every image in lock-step. [`runtime::ThreadTeam`] provides an in-process
//! runtime with one thread per image.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cafbench::{run_suite, Config};
//!
//! let report = run_suite(4, &Config::quick()).unwrap();
//! println!("{}", cafbench::output::format_report(&report));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod error;
mod result;

// Functional modules
pub mod measurement;
pub mod osu;
pub mod output;
pub mod pt2pt;
pub mod runtime;
pub mod sort;
pub mod statistics;
pub mod sync;

// Re-exports for public API
pub use config::{Config, OsuConfig, P2pConfig, SortConfig, SyncConfig};
pub use error::{Error, Result};
pub use measurement::{check_timing, RepetitionController, Timer};
pub use result::{BenchReport, LatencyRow, PingPongReport, PingPongRow, SortReport, SyncReport};
pub use statistics::{compute_stats, StatsMode, StatsResult, TimeSeries};

use runtime::{Runtime, ThreadTeam};

/// Run the enabled ping-pong, synchronisation and latency benchmarks on `rt`.
///
/// Collective: every image must call it with the same `config`. Each image
/// gets its own view of the reports back; the sort fields stay empty.
///
/// # Errors
///
/// `InvalidConfiguration` when `config` does not validate or a pattern does
/// not fit the number of images.
pub fn run_image<R: Runtime>(rt: &R, config: &Config) -> Result<BenchReport> {
    let mut report = BenchReport {
        num_images: rt.num_images(),
        ..BenchReport::default()
    };
    if config.p2p.enabled {
        report.pingpong = pt2pt::run(rt, config)?;
    }
    if config.sync.enabled {
        report.sync = sync::run(rt, config)?;
    }
    if config.osu.enabled {
        (report.get_latency, report.alloc_latency) = osu::run(rt, config)?;
    }
    Ok(report)
}

/// Run every enabled benchmark with `num_images` images in this process.
///
/// Image 0's view of the communication benchmarks is reported. The sort
/// benchmark runs afterwards, outside the team.
///
/// # Errors
///
/// `InvalidConfiguration` for a bad `config` or zero images, `Verification`
/// when a sort produced wrong output, `ThreadPool` when the sort workers
/// cannot be spawned.
pub fn run_suite(num_images: usize, config: &Config) -> Result<BenchReport> {
    config.validate()?;
    let team = ThreadTeam::new(num_images)?;

    let mut views = team.run(|image| run_image(image, config));
    // Image 0 is always present; a team has at least one image.
    let mut report = views.swap_remove(0)?;

    if config.sort.enabled {
        report.sort = sort::run(config)?;
    }
    report.timer_resolution_ns = measurement::nanos(measurement::resolution());
    Ok(report)
}
