//! Parallel, reproducible key generation and verification.

use rand::Rng;
use rand::SeedableRng;
use rand_distr::StandardNormal;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Keys generated from one RNG stream.
///
/// Fixed so the output does not depend on the number of worker threads.
const CHUNK: usize = 64 * 1024;

/// Scale of uniform and normal keys.
const KEY_SCALE: f64 = 1e6;

/// Start and width of the in-order band of [`KeyDistribution::PartialSorted`],
/// as fractions of the key count.
const PARTIAL_OFFSET: f64 = 0.2;
const PARTIAL_WIDTH: f64 = 0.5;

/// Shape of the generated input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyDistribution {
    /// Integers uniform in `[-1e6, 1e6]`.
    Uniform,
    /// `N(0, 1) x 1e6`, rounded.
    Normal,
    /// Key equals its index.
    Sorted,
    /// Key equals `total - index`.
    Reverse,
    /// In order between 20% and 70% of the array, normal elsewhere.
    PartialSorted,
}

impl KeyDistribution {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            KeyDistribution::Uniform => "uniform",
            KeyDistribution::Normal => "normal",
            KeyDistribution::Sorted => "sorted",
            KeyDistribution::Reverse => "reverse",
            KeyDistribution::PartialSorted => "partial sorted",
        }
    }

    fn key<R: Rng>(self, total: usize, index: usize, rng: &mut R) -> i64 {
        match self {
            KeyDistribution::Uniform => {
                let bound = KEY_SCALE as i64;
                rng.random_range(-bound..=bound)
            }
            KeyDistribution::Normal => normal_key(rng),
            KeyDistribution::Sorted => index as i64,
            KeyDistribution::Reverse => (total - index) as i64,
            KeyDistribution::PartialSorted => {
                let position = index as f64;
                let lower = total as f64 * PARTIAL_OFFSET;
                let upper = total as f64 * (PARTIAL_OFFSET + PARTIAL_WIDTH);
                if position > lower && position < upper {
                    index as i64
                } else {
                    normal_key(rng)
                }
            }
        }
    }
}

fn normal_key<R: Rng>(rng: &mut R) -> i64 {
    let z: f64 = rng.sample(StandardNormal);
    (z * KEY_SCALE).round() as i64
}

/// SplitMix64 of `base_seed + counter * golden`, for independent streams.
pub fn counter_seed(base_seed: u64, counter: u64) -> u64 {
    let mut z = base_seed.wrapping_add(counter.wrapping_mul(0x9e3779b97f4a7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Fill `keys` in parallel. Equal seeds give equal keys.
pub fn generate(keys: &mut [i64], distribution: KeyDistribution, seed: u64) {
    let total = keys.len();
    keys.par_chunks_mut(CHUNK)
        .enumerate()
        .for_each(|(chunk_index, chunk)| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(counter_seed(seed, chunk_index as u64));
            let base = chunk_index * CHUNK;
            for (offset, key) in chunk.iter_mut().enumerate() {
                *key = distribution.key(total, base + offset, &mut rng);
            }
        });
}

/// Sum of all keys, without overflow.
pub fn checksum(keys: &[i64]) -> i128 {
    keys.par_iter().map(|&k| i128::from(k)).sum()
}

/// Index of the first key smaller than its predecessor.
pub fn first_unordered(keys: &[i64]) -> Option<usize> {
    keys.par_windows(2)
        .position_first(|pair| pair[0] > pair[1])
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_reproducible() {
        let mut a = vec![0; 200_000];
        let mut b = vec![0; 200_000];
        generate(&mut a, KeyDistribution::Normal, 5);
        generate(&mut b, KeyDistribution::Normal, 5);
        assert_eq!(a, b);

        generate(&mut b, KeyDistribution::Normal, 6);
        assert_ne!(a, b);
    }

    #[test]
    fn test_uniform_bounds() {
        let mut keys = vec![0; 10_000];
        generate(&mut keys, KeyDistribution::Uniform, 1);
        assert!(keys.iter().all(|&k| (-1_000_000..=1_000_000).contains(&k)));
    }

    #[test]
    fn test_deterministic_shapes() {
        let mut keys = vec![0; 10];
        generate(&mut keys, KeyDistribution::Sorted, 0);
        assert_eq!(first_unordered(&keys), None);

        generate(&mut keys, KeyDistribution::Reverse, 0);
        assert_eq!(keys[0], 10);
        assert_eq!(keys[9], 1);
        assert_eq!(first_unordered(&keys), Some(1));
    }

    #[test]
    fn test_partial_sorted_band() {
        let mut keys = vec![0; 1000];
        generate(&mut keys, KeyDistribution::PartialSorted, 3);
        assert_eq!(first_unordered(&keys[201..700]), None);
        assert_eq!(keys[500], 500);
    }

    #[test]
    fn test_checksum_wide() {
        let keys = vec![i64::MAX, i64::MAX];
        assert_eq!(checksum(&keys), 2 * i128::from(i64::MAX));
    }
}
