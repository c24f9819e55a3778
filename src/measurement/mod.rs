//! Measurement infrastructure for the benchmark drivers.
//!
//! This module provides:
//! - A monotonic stopwatch and block timing ([`Timer`], [`Trial`])
//! - The busy-wait [`delay`] used as the idle reference workload
//! - Adaptive repetition control ([`RepetitionController`], [`check_timing`])
//!
//! # Control loop
//!
//! ```ignore
//! use cafbench::measurement::{RepetitionController, Timer};
//!
//! let mut ctl = RepetitionController::new(target, 1)?;
//! loop {
//!     let trial = Timer::time_block(ctl.nrep(), |_| op());
//!     if ctl.check(trial.elapsed) {
//!         series.push(trial.per_repetition());
//!         break;
//!     }
//! }
//! ```

mod controller;
mod timer;

pub use controller::{check_timing, RepetitionController, TimingDecision, TimingWindow};
pub use timer::{black_box, delay, nanos, resolution, Timer, Trial};
