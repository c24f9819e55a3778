//! Configuration for the benchmark suite.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pt2pt::{Mode, SyncMode};
use crate::sort::{KeyDistribution, SortBackend};
use crate::statistics::StatsMode;

/// Configuration for a full benchmark run.
///
/// Passed by reference to every driver; nothing is read from globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Point-to-point (ping-pong) benchmark.
    pub p2p: P2pConfig,

    /// Synchronisation benchmark.
    pub sync: SyncConfig,

    /// Shared-memory sort benchmark.
    pub sort: SortConfig,

    /// Fixed-iteration get and allocation latency benchmarks.
    pub osu: OsuConfig,

    /// Variance convention for every statistics summary (default: Reference).
    pub stats_mode: StatsMode,

    /// Optional cap on the repetition count chosen by the controller.
    ///
    /// `None` lets the count double without bound.
    pub max_repetitions: Option<usize>,

    /// Seed for random neighbour permutations and sort keys.
    ///
    /// When `None`, image 0 draws one and broadcasts it.
    pub seed: Option<u64>,
}

/// Ping-pong parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct P2pConfig {
    /// Run the benchmark at all (default: true).
    pub enabled: bool,

    /// Verify transferred values on every round trip (default: false).
    ///
    /// Slows the inner loop, but should be done occasionally.
    pub check: bool,

    /// Ping-pong between the first and the last image (default: true).
    pub single: bool,

    /// Ping-pong between all images in pairs (default: false).
    pub multi: bool,

    /// As `multi`, with half the pairs sending while the other half receives
    /// (default: false).
    pub cross: bool,

    /// Largest array, in elements, for every access pattern (default: 4 Mi).
    pub max_elements: usize,

    /// Largest stride for strided patterns (default: 128).
    pub max_stride: usize,

    /// Target duration of one timed block (default: 0.5 s).
    pub target_time: Duration,

    /// Accepted samples per size after the warm-up (default: 10).
    pub outer_reps: usize,

    /// Transfer modes to run (default: all).
    pub modes: Vec<Mode>,

    /// Synchronisation used between ping and pong (default: both).
    pub syncs: Vec<SyncMode>,
}

/// Synchronisation benchmark parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Run the benchmark at all (default: true).
    pub enabled: bool,

    /// Outer repetitions per series, after the warm-up (default: 100).
    pub outer_reps: usize,

    /// Synchronisations per timed block (default: 200).
    pub inner_reps: usize,

    /// Busy delay before each synchronisation (default: 100 us).
    pub delay: Duration,

    /// Largest neighbour count for ring and random patterns (default: 12).
    pub max_neighbours: usize,
}

/// Sort benchmark parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    /// Run the benchmark at all (default: false).
    pub enabled: bool,

    /// Keys sorted per iteration (default: 16 Mi).
    pub elements: usize,

    /// Timed iterations after the warm-up iteration (default: 10).
    pub iterations: usize,

    /// Worker threads; `None` uses one per logical CPU.
    pub threads: Option<usize>,

    /// Key distribution (default: Uniform).
    pub distribution: KeyDistribution,

    /// Sort implementations to compare (default: parallel unstable, sequential).
    pub backends: Vec<SortBackend>,
}

/// Get and allocation latency parameters.
///
/// Sections above `large_elements` use the `_large` iteration counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OsuConfig {
    /// Run the benchmarks at all (default: false).
    pub enabled: bool,

    /// Largest section, in elements (default: 2 Mi, i.e. 16 MiB).
    pub max_elements: usize,

    /// Untimed iterations per size (default: 100).
    pub skip: usize,

    /// Timed iterations per size (default: 10000).
    pub loops: usize,

    /// Untimed iterations for large sections and allocations (default: 10).
    pub skip_large: usize,

    /// Timed iterations for large sections and allocations (default: 100).
    pub loops_large: usize,

    /// Size threshold, in elements (default: 1024, i.e. 8 KiB).
    pub large_elements: usize,
}

impl Default for OsuConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_elements: 2 * 1024 * 1024,
            skip: 100,
            loops: 10_000,
            skip_large: 10,
            loops_large: 100,
            large_elements: 1024,
        }
    }
}

impl Default for P2pConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check: false,
            single: true,
            multi: false,
            cross: false,
            max_elements: 4 * 1024 * 1024,
            max_stride: 128,
            target_time: Duration::from_millis(500),
            outer_reps: 10,
            modes: Mode::ALL.to_vec(),
            syncs: vec![SyncMode::All, SyncMode::Pt2pt],
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            outer_reps: 100,
            inner_reps: 200,
            delay: Duration::from_micros(100),
            max_neighbours: 12,
        }
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            elements: 16 * 1024 * 1024,
            iterations: 10,
            threads: None,
            distribution: KeyDistribution::Uniform,
            backends: vec![SortBackend::ParallelUnstable, SortBackend::Sequential],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            p2p: P2pConfig::default(),
            sync: SyncConfig::default(),
            sort: SortConfig::default(),
            osu: OsuConfig::default(),
            stats_mode: StatsMode::Reference,
            max_repetitions: None,
            seed: None,
        }
    }
}

impl Config {
    /// Reduced sizes and repetition counts for smoke runs.
    ///
    /// Settings:
    /// - 4 Ki elements, stride up to 16, 2 ms target, 4 outer repetitions
    /// - sync: 5 outer x 20 inner repetitions, 10 us delay
    /// - sort enabled with 256 Ki keys and 3 iterations
    /// - latency benchmarks enabled up to 4 Ki elements, 10 + 100 iterations
    pub fn quick() -> Self {
        Self {
            p2p: P2pConfig {
                max_elements: 4 * 1024,
                max_stride: 16,
                target_time: Duration::from_millis(2),
                outer_reps: 4,
                ..P2pConfig::default()
            },
            sync: SyncConfig {
                outer_reps: 5,
                inner_reps: 20,
                delay: Duration::from_micros(10),
                max_neighbours: 4,
                ..SyncConfig::default()
            },
            sort: SortConfig {
                enabled: true,
                elements: 256 * 1024,
                iterations: 3,
                ..SortConfig::default()
            },
            osu: OsuConfig {
                enabled: true,
                max_elements: 4 * 1024,
                skip: 10,
                loops: 100,
                skip_large: 2,
                loops_large: 10,
                ..OsuConfig::default()
            },
            max_repetitions: Some(1 << 20),
            ..Config::default()
        }
    }

    /// Check every parameter before any benchmark starts.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        if self.max_repetitions == Some(0) {
            return Err(Error::config("max_repetitions must be at least 1"));
        }
        self.p2p.validate()?;
        self.sync.validate()?;
        self.sort.validate()?;
        self.osu.validate()
    }
}

impl P2pConfig {
    fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.target_time.is_zero() {
            return Err(Error::config("p2p.target_time must be positive"));
        }
        if self.outer_reps < 2 {
            return Err(Error::config("p2p.outer_reps must be at least 2"));
        }
        if self.max_elements == 0 {
            return Err(Error::config("p2p.max_elements must be positive"));
        }
        if self.max_stride == 0 {
            return Err(Error::config("p2p.max_stride must be positive"));
        }
        if self.max_stride > self.max_elements {
            return Err(Error::config(format!(
                "p2p.max_stride ({}) exceeds p2p.max_elements ({})",
                self.max_stride, self.max_elements
            )));
        }
        Ok(())
    }
}

impl SyncConfig {
    fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.outer_reps < 2 {
            return Err(Error::config("sync.outer_reps must be at least 2"));
        }
        if self.inner_reps == 0 {
            return Err(Error::config("sync.inner_reps must be positive"));
        }
        if self.max_neighbours % 2 != 0 {
            return Err(Error::config(format!(
                "sync.max_neighbours must be even, got {}",
                self.max_neighbours
            )));
        }
        Ok(())
    }
}

impl SortConfig {
    fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.elements == 0 {
            return Err(Error::config("sort.elements must be positive"));
        }
        if self.iterations < 2 {
            return Err(Error::config("sort.iterations must be at least 2"));
        }
        if self.threads == Some(0) {
            return Err(Error::config("sort.threads must be positive"));
        }
        Ok(())
    }
}

impl OsuConfig {
    fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.loops == 0 || self.loops_large == 0 {
            return Err(Error::config("osu.loops and osu.loops_large must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        Config::default().validate().unwrap();
        Config::quick().validate().unwrap();
    }

    #[test]
    fn test_default_reference_parameters() {
        let config = Config::default();
        assert_eq!(config.p2p.target_time, Duration::from_millis(500));
        assert_eq!(config.sync.outer_reps, 100);
        assert_eq!(config.sync.inner_reps, 200);
        assert_eq!(config.sync.delay, Duration::from_micros(100));
        assert_eq!(config.sync.max_neighbours, 12);
        assert_eq!(config.stats_mode, StatsMode::Reference);
        assert_eq!(config.p2p.modes.len(), 20);
    }

    #[test]
    fn test_zero_target_rejected() {
        let mut config = Config::default();
        config.p2p.target_time = Duration::ZERO;
        assert!(matches!(config.validate(), Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_single_outer_rep_rejected() {
        let mut config = Config::default();
        config.sync.outer_reps = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disabled_sections_skip_validation() {
        let mut config = Config::default();
        config.sync.enabled = false;
        config.sync.outer_reps = 0;
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"sync": {"inner_reps": 7}}"#).unwrap();
        assert_eq!(config.sync.inner_reps, 7);
        assert_eq!(config.sync.outer_reps, 100);
        assert_eq!(config.p2p.max_stride, 128);
    }

    #[test]
    fn test_odd_neighbours_rejected() {
        let mut config = Config::default();
        config.sync.max_neighbours = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_ceiling_rejected() {
        let config = Config {
            max_repetitions: Some(0),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_osu_loops_rejected() {
        let mut config = Config::default();
        config.osu.enabled = true;
        config.osu.loops_large = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfiguration(_))));
    }
}
