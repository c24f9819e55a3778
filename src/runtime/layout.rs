//! Block-strided access patterns over a symmetric array.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// `count` blocks of `blksize` consecutive elements, block starts `stride`
/// apart, beginning at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Index of the first element.
    pub offset: usize,
    /// Number of blocks.
    pub count: usize,
    /// Elements per block.
    pub blksize: usize,
    /// Distance between block starts.
    pub stride: usize,
}

impl Layout {
    /// Blocks starting at element 0.
    pub fn new(count: usize, blksize: usize, stride: usize) -> Self {
        Self {
            offset: 0,
            count,
            blksize,
            stride,
        }
    }

    /// A single block of `n` elements starting at element 0.
    pub fn contiguous(n: usize) -> Self {
        Self::new(1, n, n)
    }

    /// Elements covered by the pattern.
    pub fn ndata(&self) -> usize {
        self.count * self.blksize
    }

    /// Span from the first to the last element covered, inclusive.
    pub fn extent(&self) -> usize {
        if self.count == 0 || self.blksize == 0 {
            0
        } else {
            self.blksize + (self.count - 1) * self.stride
        }
    }

    /// Index ranges of the blocks.
    pub fn blocks(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.count).map(move |i| {
            let start = self.offset + i * self.stride;
            start..start + self.blksize
        })
    }

    /// The `i`-th block as a layout of its own.
    pub fn block(&self, i: usize) -> Layout {
        Layout {
            offset: self.offset + i * self.stride,
            count: 1,
            blksize: self.blksize,
            stride: self.blksize,
        }
    }

    /// The single element at `index`.
    pub fn element(index: usize) -> Layout {
        Layout {
            offset: index,
            count: 1,
            blksize: 1,
            stride: 1,
        }
    }

    /// Indices of every covered element, block by block.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks().flatten()
    }

    /// Copy the covered elements of `src` into `out`, replacing its contents.
    pub fn gather(&self, src: &[f64], out: &mut Vec<f64>) {
        out.clear();
        for block in self.blocks() {
            out.extend_from_slice(&src[block]);
        }
    }

    /// Write `packed` into the covered elements of `dst`, in block order.
    pub fn scatter(&self, packed: &[f64], dst: &mut [f64]) {
        let mut cursor = 0;
        for block in self.blocks() {
            let len = block.len();
            dst[block].copy_from_slice(&packed[cursor..cursor + len]);
            cursor += len;
        }
    }

    /// Set every covered element of `dst` to `value`.
    pub fn fill(&self, dst: &mut [f64], value: f64) {
        for block in self.blocks() {
            dst[block].fill(value);
        }
    }

    /// Whether every covered element of `src` equals `value`.
    pub fn verify(&self, src: &[f64], value: f64) -> bool {
        self.blocks().all(|block| src[block].iter().all(|&x| x == value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_and_ndata() {
        let layout = Layout::new(4, 2, 8);
        assert_eq!(layout.ndata(), 8);
        assert_eq!(layout.extent(), 2 + 3 * 8);
        assert_eq!(Layout::new(0, 4, 4).extent(), 0);
    }

    #[test]
    fn test_gather_scatter() {
        let src: Vec<f64> = (0..10).map(f64::from).collect();
        let layout = Layout::new(3, 1, 4);
        let mut packed = Vec::new();
        layout.gather(&src, &mut packed);
        assert_eq!(packed, vec![0.0, 4.0, 8.0]);

        let mut dst = vec![0.0; 10];
        layout.scatter(&[7.0, 8.0, 9.0], &mut dst);
        assert_eq!(dst[4], 8.0);
        assert_eq!(dst[1], 0.0);
    }

    #[test]
    fn test_fill_verify() {
        let mut dst = vec![0.0; 16];
        let layout = Layout::new(2, 3, 8);
        layout.fill(&mut dst, 2.5);
        assert!(layout.verify(&dst, 2.5));
        assert_eq!(dst[3], 0.0);
        dst[9] = 1.0;
        assert!(!layout.verify(&dst, 2.5));
    }

    #[test]
    fn test_block_and_element() {
        let layout = Layout::new(3, 2, 5);
        assert_eq!(layout.block(2).indices().collect::<Vec<_>>(), vec![10, 11]);
        assert_eq!(Layout::element(6).indices().collect::<Vec<_>>(), vec![6]);
    }
}
