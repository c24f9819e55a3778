//! Adaptive repetition control.
//!
//! After each timed block the driver asks whether the block's window was
//! acceptable for the target duration:
//! - above `4/3 x target` the block ran too long, the repetition count is
//!   halved (floored at 1) and the block must be re-run;
//! - otherwise the block is kept and the count is doubled, becoming the
//!   starting point for the next measurement.
//!
//! [`check_timing`] is the pure decision. [`RepetitionController`] owns the
//! repetition count between trials and adds two guards: an optional ceiling,
//! and acceptance of a single-repetition block that still overshoots (there
//! is no smaller count to retry with).

use std::time::Duration;

use crate::error::{Error, Result};

/// Acceptable band around a target duration.
///
/// Comparisons are exact, on integer nanoseconds. The microsecond bounds are
/// kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingWindow {
    /// Target duration of a block.
    pub target: Duration,
    /// `2/3 x target`, in microseconds.
    pub lower_us: f64,
    /// `4/3 x target`, in microseconds.
    pub upper_us: f64,
}

impl TimingWindow {
    /// Window around `target`.
    pub fn around(target: Duration) -> Self {
        let target_us = duration_us(target);
        Self {
            target,
            lower_us: target_us * 2.0 / 3.0,
            upper_us: target_us * 4.0 / 3.0,
        }
    }

    /// Whether `observed` lies above `4/3 x target`.
    pub fn overshoots(&self, observed: Duration) -> bool {
        observed.as_nanos() * 3 > self.target.as_nanos() * 4
    }

    /// Whether `observed` lies below `2/3 x target`.
    pub fn undershoots(&self, observed: Duration) -> bool {
        observed.as_nanos() * 3 < self.target.as_nanos() * 2
    }
}

/// Outcome of [`check_timing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingDecision {
    /// `true` when the block can be kept; `false` when it must be re-run.
    pub accepted: bool,
    /// Repetition count for the next block.
    pub nrep: usize,
}

/// Decide whether a block of `nrep` repetitions that took `observed` is
/// acceptable for `target`.
///
/// Returns the decision and the adjusted count: halved (at least 1) on
/// rejection, doubled on acceptance. `target` is not validated here; a zero
/// target rejects every non-zero observation.
pub fn check_timing(nrep: usize, observed: Duration, target: Duration) -> TimingDecision {
    let window = TimingWindow::around(target);

    if window.overshoots(observed) {
        TimingDecision {
            accepted: false,
            nrep: (nrep / 2).max(1),
        }
    } else {
        TimingDecision {
            accepted: true,
            nrep: nrep.saturating_mul(2).max(1),
        }
    }
}

/// Repetition count threaded through a benchmark's control loop.
#[derive(Debug, Clone)]
pub struct RepetitionController {
    nrep: usize,
    initial: usize,
    target: Duration,
    window: TimingWindow,
    ceiling: Option<usize>,
}

impl RepetitionController {
    /// Create a controller starting at `initial` repetitions.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` when `target` is zero.
    pub fn new(target: Duration, initial: usize) -> Result<Self> {
        if target.is_zero() {
            return Err(Error::config("target time must be positive"));
        }
        let initial = initial.max(1);
        Ok(Self {
            nrep: initial,
            initial,
            target,
            window: TimingWindow::around(target),
            ceiling: None,
        })
    }

    /// Cap the repetition count.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` when `ceiling` is zero.
    pub fn with_ceiling(mut self, ceiling: Option<usize>) -> Result<Self> {
        if ceiling == Some(0) {
            return Err(Error::config("repetition ceiling must be at least 1"));
        }
        self.ceiling = ceiling;
        self.nrep = self.clamp(self.nrep);
        self.initial = self.clamp(self.initial);
        Ok(self)
    }

    /// Repetitions to use for the next block.
    pub fn nrep(&self) -> usize {
        self.nrep
    }

    /// Target duration of a block.
    pub fn target(&self) -> Duration {
        self.target
    }

    /// Acceptable band around the target.
    pub fn window(&self) -> TimingWindow {
        self.window
    }

    /// Feed the elapsed time of a block run with [`nrep`](Self::nrep)
    /// repetitions. Returns `true` when the block can be kept.
    pub fn check(&mut self, observed: Duration) -> bool {
        let used = self.nrep;
        let decision = check_timing(used, observed, self.target);

        if self.window.undershoots(observed) {
            tracing::debug!(
                nrep = used,
                observed_us = duration_us(observed),
                lower_us = self.window.lower_us,
                "block below timing window"
            );
        }

        self.nrep = self.clamp(decision.nrep);

        if decision.accepted {
            return true;
        }

        if used == 1 {
            tracing::debug!(
                observed_us = duration_us(observed),
                upper_us = self.window.upper_us,
                "single repetition overshoots timing window, keeping it"
            );
            return true;
        }

        tracing::debug!(
            from = used,
            to = self.nrep,
            observed_us = duration_us(observed),
            "block overshoots timing window, retrying"
        );
        false
    }

    /// Restore the initial repetition count.
    pub fn reset(&mut self) {
        self.nrep = self.initial;
    }

    fn clamp(&self, nrep: usize) -> usize {
        match self.ceiling {
            Some(max) => nrep.clamp(1, max),
            None => nrep.max(1),
        }
    }
}

#[inline]
fn duration_us(d: Duration) -> f64 {
    d.as_secs_f64() * 1e6
}

#[cfg(test)]
mod tests {
    use super::*;

    fn us(v: u64) -> Duration {
        Duration::from_micros(v)
    }

    #[test]
    fn test_window_brackets_target() {
        let window = TimingWindow::around(us(1000));
        assert!((window.upper_us - 4000.0 / 3.0).abs() < 1e-9);
        assert!((window.lower_us - 2000.0 / 3.0).abs() < 1e-9);
        assert!(window.lower_us < 1000.0 && 1000.0 < window.upper_us);
    }

    #[test]
    fn test_window_small_target() {
        // 1us target: truncating the bounds to whole microseconds would give 1us.
        let window = TimingWindow::around(us(1));
        assert!(window.overshoots(Duration::from_nanos(1400)));
        assert!(!window.overshoots(Duration::from_nanos(1300)));
    }

    #[test]
    fn test_accept_doubles() {
        let d = check_timing(4, us(1000), us(1000));
        assert_eq!(d, TimingDecision { accepted: true, nrep: 8 });
    }

    #[test]
    fn test_reject_halves() {
        let d = check_timing(8, us(2000), us(1000));
        assert_eq!(d, TimingDecision { accepted: false, nrep: 4 });
    }

    #[test]
    fn test_reject_floor() {
        let d = check_timing(1, us(5000), us(1000));
        assert_eq!(d, TimingDecision { accepted: false, nrep: 1 });
    }

    #[test]
    fn test_exact_upper_bound_accepted() {
        let d = check_timing(3, Duration::from_nanos(1_333_333), us(1000));
        assert!(d.accepted);
        assert_eq!(d.nrep, 6);
    }

    #[test]
    fn test_controller_rejects_zero_target() {
        assert!(matches!(
            RepetitionController::new(Duration::ZERO, 1),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_controller_accepts_single_overshoot() {
        let mut ctl = RepetitionController::new(us(100), 1).unwrap();
        assert!(ctl.check(us(10_000)));
        assert_eq!(ctl.nrep(), 1);
    }

    #[test]
    fn test_controller_retries_then_accepts() {
        let mut ctl = RepetitionController::new(us(100), 8).unwrap();
        assert!(!ctl.check(us(400)));
        assert_eq!(ctl.nrep(), 4);
        assert!(ctl.check(us(120)));
        assert_eq!(ctl.nrep(), 8);
    }

    #[test]
    fn test_controller_ceiling() {
        let mut ctl = RepetitionController::new(us(100), 4)
            .unwrap()
            .with_ceiling(Some(6))
            .unwrap();
        assert!(ctl.check(us(10)));
        assert_eq!(ctl.nrep(), 6);
        assert!(ctl.check(us(10)));
        assert_eq!(ctl.nrep(), 6);
    }

    #[test]
    fn test_controller_zero_ceiling_rejected() {
        let ctl = RepetitionController::new(us(100), 1).unwrap();
        assert!(ctl.with_ceiling(Some(0)).is_err());
    }

    #[test]
    fn test_controller_reset() {
        let mut ctl = RepetitionController::new(us(100), 2).unwrap();
        ctl.check(us(1));
        ctl.check(us(1));
        assert_eq!(ctl.nrep(), 8);
        ctl.reset();
        assert_eq!(ctl.nrep(), 2);
    }
}
