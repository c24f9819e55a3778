//! Monotonic wall-clock timing for benchmark blocks.
//!
//! Every timed block in the drivers goes through [`Timer`], which wraps
//! `std::time::Instant`. Results of the measured closures are passed through
//! [`black_box`] so the compiler cannot drop the work being timed.

use std::hint::black_box as std_black_box;
use std::time::{Duration, Instant};

/// Wrapper around `std::hint::black_box` for preventing compiler optimizations.
#[inline]
pub fn black_box<T>(x: T) -> T {
    std_black_box(x)
}

/// One measured execution of the operation under test.
///
/// A trial covers `repetitions` consecutive inner iterations timed as a single
/// block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trial {
    /// Inner iterations executed inside the timed block (at least 1).
    pub repetitions: usize,
    /// Wall-clock time of the whole block.
    pub elapsed: Duration,
}

impl Trial {
    /// Record a trial. A repetition count of zero is stored as 1.
    pub fn new(repetitions: usize, elapsed: Duration) -> Self {
        Self {
            repetitions: repetitions.max(1),
            elapsed,
        }
    }

    /// Elapsed time of a single inner iteration, truncated to whole
    /// nanoseconds.
    pub fn per_repetition(&self) -> Duration {
        let per_rep = self.elapsed.as_nanos() / self.repetitions as u128;
        Duration::from_nanos(u64::try_from(per_rep).unwrap_or(u64::MAX))
    }
}

/// `d` in whole nanoseconds, saturating at `u64::MAX` (about 584 years).
#[inline]
pub fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Stopwatch over the monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start timing now.
    #[inline]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time elapsed since [`Timer::start`].
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Run `f` `repetitions` times inside one timed block.
    ///
    /// The closure receives the zero-based inner iteration index.
    #[inline]
    pub fn time_block<F, T>(repetitions: usize, mut f: F) -> Trial
    where
        F: FnMut(usize) -> T,
    {
        let timer = Self::start();
        for irep in 0..repetitions {
            black_box(f(irep));
        }
        Trial::new(repetitions, timer.elapsed())
    }
}

/// Busy-wait for `duration`.
///
/// This is the body of the idle reference loop in the synchronisation
/// benchmark. Spinning keeps the wait independent of scheduler wake-up
/// latency, which would otherwise dominate delays of a few microseconds.
#[inline]
pub fn delay(duration: Duration) {
    if duration.is_zero() {
        return;
    }
    let start = Instant::now();
    while start.elapsed() < duration {
        std::hint::spin_loop();
    }
}

/// Estimate the clock resolution as the smallest non-zero difference
/// between consecutive reads.
pub fn resolution() -> Duration {
    let mut min_diff = Duration::MAX;

    for _ in 0..1000 {
        let t1 = Instant::now();
        let mut t2 = Instant::now();
        while t2 == t1 {
            t2 = Instant::now();
        }
        let diff = t2 - t1;
        if diff < min_diff {
            min_diff = diff;
        }
    }

    min_diff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trial_per_repetition() {
        let trial = Trial::new(4, Duration::from_micros(1000));
        assert_eq!(trial.per_repetition(), Duration::from_micros(250));
    }

    #[test]
    fn test_trial_floors_repetitions() {
        let trial = Trial::new(0, Duration::from_micros(10));
        assert_eq!(trial.repetitions, 1);
        assert_eq!(trial.per_repetition(), Duration::from_micros(10));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_per_repetition_beyond_u32_count() {
        let reps = (u32::MAX as usize) * 4;
        let trial = Trial::new(reps, Duration::from_nanos(reps as u64 * 3));
        assert_eq!(trial.per_repetition(), Duration::from_nanos(3));
    }

    #[test]
    fn test_nanos_exact() {
        assert_eq!(nanos(Duration::new(2, 7)), 2_000_000_007);
        assert_eq!(nanos(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_time_block_runs_every_iteration() {
        let mut seen = Vec::new();
        let trial = Timer::time_block(5, |irep| seen.push(irep));
        assert_eq!(trial.repetitions, 5);
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_delay_waits_at_least_duration() {
        let timer = Timer::start();
        delay(Duration::from_micros(200));
        assert!(timer.elapsed() >= Duration::from_micros(200));
    }

    #[test]
    fn test_resolution_reasonable() {
        let res = resolution();
        assert!(res > Duration::ZERO);
        assert!(res < Duration::from_millis(1), "resolution = {:?}", res);
    }
}
