//! Neighbour lists for point-to-point synchronisation patterns.
//!
//! Every image computes its own list; lists are symmetric (if `j` appears in
//! `i`'s list, `i` appears in `j`'s list as often), which `sync images`
//! requires to make progress.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shape of a neighbour pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topology {
    /// Image `i` paired with `i + n/2`.
    Pair,
    /// Nearest neighbours on a ring.
    Ring,
    /// Nearest neighbours on a randomly permuted ring.
    Random,
}

/// Partner of `me` when images `i` and `i + n/2` are paired.
///
/// `None` unless `n` is even and at least 2.
pub fn pair_partner(me: usize, n: usize) -> Option<usize> {
    if n < 2 || n % 2 != 0 {
        return None;
    }
    let half = n / 2;
    Some(if me < half { me + half } else { me - half })
}

/// Ring position `k + 1` steps after `i`.
pub fn partner(i: usize, k: usize, n: usize) -> usize {
    (i + k + 1) % n
}

/// Permutation of `0..n` determined by `seed`.
///
/// Identical on every image given the same seed.
pub fn permutation(n: usize, seed: u64) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..n).collect();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    perm.shuffle(&mut rng);
    perm
}

/// Neighbours of image `me` out of `n` under `topology`.
///
/// Ring and random patterns place images on a ring (identity or seeded
/// permutation) and connect each to the `count / 2` positions on either side.
/// `count` is ignored for [`Topology::Pair`].
///
/// # Errors
///
/// `InvalidConfiguration` when the pattern cannot be built: odd or zero
/// `count`, `count >= n` for rings, odd `n` for pairs.
pub fn neighbours(me: usize, n: usize, count: usize, topology: Topology, seed: u64) -> Result<Vec<usize>> {
    if me >= n {
        return Err(Error::config(format!("image {} out of range for {} images", me, n)));
    }

    let perm = match topology {
        Topology::Pair => {
            return pair_partner(me, n).map(|p| vec![p]).ok_or_else(|| {
                Error::config(format!("pair pattern needs an even image count, got {}", n))
            });
        }
        Topology::Ring => (0..n).collect::<Vec<_>>(),
        Topology::Random => permutation(n, seed),
    };

    if count == 0 || count % 2 != 0 {
        return Err(Error::config(format!(
            "neighbour count must be even and positive, got {}",
            count
        )));
    }
    if count >= n {
        return Err(Error::config(format!(
            "{} neighbours need more than {} images",
            count, n
        )));
    }

    let mut neighs = Vec::with_capacity(count);
    for i in 0..n {
        for k in 0..count / 2 {
            let j = partner(i, k, n);
            if perm[i] == me {
                neighs.push(perm[j]);
            }
            if perm[j] == me {
                neighs.push(perm[i]);
            }
        }
    }

    debug_assert_eq!(neighs.len(), count);
    Ok(neighs)
}
