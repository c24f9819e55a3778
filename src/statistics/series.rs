//! Time series of accepted measurements.

use std::time::Duration;

/// Ordered accepted durations of one measurement point.
///
/// Entry 0 is the warm-up sample; entries `1..=outer_reps` feed the
/// statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSeries {
    values: Vec<Duration>,
}

impl TimeSeries {
    /// Empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty series with room for a warm-up plus `outer_reps` samples.
    pub fn with_outer_reps(outer_reps: usize) -> Self {
        Self {
            values: Vec::with_capacity(outer_reps + 1),
        }
    }

    /// Append an accepted duration.
    pub fn push(&mut self, value: Duration) {
        self.values.push(value);
    }

    /// Number of recorded entries, warm-up included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Samples recorded after the warm-up.
    pub fn outer_reps(&self) -> usize {
        self.values.len().saturating_sub(1)
    }

    /// The warm-up entry, if recorded.
    pub fn warmup(&self) -> Option<Duration> {
        self.values.first().copied()
    }

    /// Entries after the warm-up.
    pub fn samples(&self) -> &[Duration] {
        self.values.get(1..).unwrap_or(&[])
    }

    /// All entries, warm-up first.
    pub fn as_slice(&self) -> &[Duration] {
        &self.values
    }
}

impl From<Vec<Duration>> for TimeSeries {
    fn from(values: Vec<Duration>) -> Self {
        Self { values }
    }
}

impl FromIterator<Duration> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = Duration>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
