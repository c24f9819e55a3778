//! One-sided communication runtime seen by the drivers.
//!
//! The drivers only need a handful of PGAS primitives: image identity,
//! barriers, pairwise `sync images`, mutual exclusion, a few collectives to
//! keep every image's control loop in lock-step, and a symmetric array that
//! other images can put into and get from. [`Runtime`] and
//! [`SymmetricArray`] describe that surface; [`ThreadTeam`] implements it
//! in-process with one thread per image.

mod layout;
pub mod neighbours;
mod team;

pub use layout::Layout;
pub use neighbours::Topology;
pub use team::{Image, TeamArray, ThreadTeam};

/// Array with one equally sized segment per image.
pub trait SymmetricArray {
    /// Elements in each image's segment.
    fn len(&self) -> usize;

    /// Whether segments are empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read this image's segment.
    fn with_local<R>(&self, f: impl FnOnce(&[f64]) -> R) -> R;

    /// Modify this image's segment.
    fn with_local_mut<R>(&self, f: impl FnOnce(&mut [f64]) -> R) -> R;

    /// Set every element of this image's segment.
    fn fill_local(&self, value: f64) {
        self.with_local_mut(|local| local.fill(value));
    }

    /// Write `packed` into `image`'s segment at the positions of `layout`.
    ///
    /// Completes before returning; no flush is needed.
    fn put(&self, image: usize, layout: &Layout, packed: &[f64]);

    /// Read the positions of `layout` from `image`'s segment into `out`,
    /// replacing its contents.
    fn get(&self, image: usize, layout: &Layout, out: &mut Vec<f64>);
}

/// Parallel runtime primitives, called identically by every image.
///
/// Collective operations (`sync_all`, `reduce_max`, `all_true`,
/// `broadcast`, `allocate`) must be entered by all images in the same order.
pub trait Runtime {
    /// Symmetric array type produced by [`allocate`](Self::allocate).
    type Array: SymmetricArray;

    /// Zero-based index of the calling image.
    fn this_image(&self) -> usize;

    /// Number of images in the run.
    fn num_images(&self) -> usize;

    /// Barrier over all images.
    fn sync_all(&self);

    /// Pairwise synchronisation with each listed image.
    ///
    /// Returns once every listed image has executed as many `sync_images`
    /// naming this image as this image has executed naming it.
    fn sync_images(&self, images: &[usize]);

    /// Run `f` while no other image is inside a critical section.
    fn critical<R>(&self, f: impl FnOnce() -> R) -> R;

    /// Run `f` while holding the lock owned by `image`.
    fn lock<R>(&self, image: usize, f: impl FnOnce() -> R) -> R;

    /// Maximum of `value` over all images.
    ///
    /// The drivers reduce elapsed times as whole nanoseconds, so every image
    /// feeds the controller the identical value.
    fn reduce_max(&self, value: u64) -> u64;

    /// Whether `value` is true on every image.
    fn all_true(&self, value: bool) -> bool;

    /// `value` as passed by image `root`.
    fn broadcast(&self, value: u64, root: usize) -> u64;

    /// Allocate a zeroed symmetric array of `len` elements per image.
    fn allocate(&self, len: usize) -> Self::Array;
}
