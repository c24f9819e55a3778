//! Statistical summary of benchmark time series.
//!
//! This module provides:
//! - [`TimeSeries`]: accepted durations of one measurement point, warm-up first
//! - [`compute_stats`]: mean, standard deviation and 3-sigma outlier count
//! - [`confidence_half_width`]: 95% error bound for a difference of means

mod series;
mod stats;

pub use series::TimeSeries;
pub use stats::{
    compute_stats, confidence_half_width, StatsMode, StatsResult, CONF95, OUTLIER_SIGMAS,
};
