//! Outlier-aware summary of a time series.
//!
//! The warm-up entry is excluded from the mean and from the outlier scan.
//! In [`StatsMode::Reference`] it still contributes to the variance sum,
//! matching the published benchmark figures; [`StatsMode::Corrected`] leaves
//! it out of the variance too.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::series::TimeSeries;

/// Outliers lie more than this many standard deviations from the mean.
pub const OUTLIER_SIGMAS: f64 = 3.0;

/// Normal quantile for a two-sided 95% interval.
pub const CONF95: f64 = 1.96;

/// Which entries enter the variance sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatsMode {
    /// Sum squared deviations over every entry, warm-up included.
    #[default]
    Reference,
    /// Sum squared deviations over the post-warm-up entries only.
    Corrected,
}

/// Summary of one time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsResult {
    /// Mean of the post-warm-up entries, truncated to whole nanoseconds.
    pub mean: Duration,
    /// Standard deviation in microseconds.
    pub std_dev_us: f64,
    /// Post-warm-up entries further than `3 x std_dev` from the mean.
    pub outliers: usize,
}

impl StatsResult {
    /// Mean in microseconds.
    pub fn mean_us(&self) -> f64 {
        self.mean.as_secs_f64() * 1e6
    }
}

/// Summarize `series`, whose entry 0 is a warm-up sample.
///
/// # Errors
///
/// `InvalidConfiguration` when `outer_reps < 2` (the variance denominator
/// `outer_reps - 1` would vanish) or when the series does not hold exactly
/// `outer_reps + 1` entries.
pub fn compute_stats(series: &TimeSeries, outer_reps: usize, mode: StatsMode) -> Result<StatsResult> {
    if outer_reps < 2 {
        return Err(Error::config(format!(
            "statistics need at least 2 outer repetitions, got {}",
            outer_reps
        )));
    }
    if series.len() != outer_reps + 1 {
        return Err(Error::config(format!(
            "series holds {} entries, expected {} (warm-up + {} repetitions)",
            series.len(),
            outer_reps + 1,
            outer_reps
        )));
    }

    let samples = series.samples();
    let sum_ns: u128 = samples.iter().map(Duration::as_nanos).sum();
    let mean_ns = sum_ns / outer_reps as u128;
    let mean = Duration::from_nanos(u64::try_from(mean_ns).unwrap_or(u64::MAX));

    let scanned: &[Duration] = match mode {
        StatsMode::Reference => series.as_slice(),
        StatsMode::Corrected => samples,
    };
    let sum_sq: f64 = scanned.iter().map(|&t| deviation_us(t, mean).powi(2)).sum();
    let std_dev_us = (sum_sq / (outer_reps - 1) as f64).sqrt();

    let cutoff = OUTLIER_SIGMAS * std_dev_us;
    let outliers = samples
        .iter()
        .filter(|&&t| deviation_us(t, mean).abs() > cutoff)
        .count();

    Ok(StatsResult {
        mean,
        std_dev_us,
        outliers,
    })
}

/// Half-width of the 95% interval for a difference of two means whose
/// standard deviations are `a` and `b`.
pub fn confidence_half_width(a: f64, b: f64) -> f64 {
    CONF95 * (a + b)
}

#[inline]
fn deviation_us(t: Duration, mean: Duration) -> f64 {
    (t.as_nanos() as f64 - mean.as_nanos() as f64) / 1e3
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_us(values: &[u64]) -> TimeSeries {
        values.iter().copied().map(Duration::from_micros).collect()
    }

    #[test]
    fn test_constant_series() {
        let stats = compute_stats(&series_us(&[100; 5]), 4, StatsMode::Reference).unwrap();
        assert_eq!(stats.mean, Duration::from_micros(100));
        assert_eq!(stats.std_dev_us, 0.0);
        assert_eq!(stats.outliers, 0);
    }

    #[test]
    fn test_reference_includes_warmup_in_variance() {
        // mean of entries 1..=4 is 175us
        // squares: 4 x 75^2 + 225^2 = 73125 over all five entries
        let series = series_us(&[100, 100, 100, 100, 400]);
        let stats = compute_stats(&series, 4, StatsMode::Reference).unwrap();
        assert_eq!(stats.mean, Duration::from_micros(175));
        assert!((stats.std_dev_us - (73125.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert_eq!(stats.outliers, 0);
    }

    #[test]
    fn test_corrected_excludes_warmup_from_variance() {
        let series = series_us(&[100, 100, 100, 100, 400]);
        let stats = compute_stats(&series, 4, StatsMode::Corrected).unwrap();
        assert_eq!(stats.mean, Duration::from_micros(175));
        assert!((stats.std_dev_us - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_warmup_ignored_by_mean() {
        let stats = compute_stats(&series_us(&[10_000, 10, 20, 30]), 3, StatsMode::Reference).unwrap();
        assert_eq!(stats.mean, Duration::from_micros(20));
    }

    #[test]
    fn test_single_outlier_flagged() {
        let mut values = vec![100; 21];
        values[7] = 1000;
        let stats = compute_stats(&series_us(&values), 20, StatsMode::Reference).unwrap();
        assert_eq!(stats.mean, Duration::from_micros(145));
        assert_eq!(stats.outliers, 1);
    }

    #[test]
    fn test_warmup_never_counted_as_outlier() {
        let mut values = vec![100; 21];
        values[0] = 1_000_000;
        let stats = compute_stats(&series_us(&values), 20, StatsMode::Corrected).unwrap();
        assert_eq!(stats.std_dev_us, 0.0);
        assert_eq!(stats.outliers, 0);
    }

    #[test]
    fn test_mean_truncates() {
        let series: TimeSeries = [1, 1, 1, 2].into_iter().map(Duration::from_nanos).collect();
        let stats = compute_stats(&series, 3, StatsMode::Reference).unwrap();
        assert_eq!(stats.mean, Duration::from_nanos(1));
    }

    #[test]
    fn test_too_few_outer_reps() {
        let err = compute_stats(&series_us(&[1, 2]), 1, StatsMode::Reference).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_length_mismatch() {
        let err = compute_stats(&series_us(&[1, 2, 3]), 3, StatsMode::Reference).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_confidence_half_width() {
        assert!((confidence_half_width(1.0, 2.0) - 5.88).abs() < 1e-12);
    }
}
