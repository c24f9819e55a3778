//! Point-to-point ping-pong benchmark.
//!
//! Two images bounce an array section back and forth: image1 transfers the
//! section to image2, both synchronise, image2 transfers it back, both
//! synchronise. The section shape is swept from small to large for each
//! [`Mode`], and every size is measured with the adaptive repetition
//! controller until a full time series is accepted.

mod pingpong;

use serde::{Deserialize, Serialize};

use crate::runtime::Layout;

pub use pingpong::{pingpong, run, Pairing, PingPong};

/// Which image moves the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// The sender writes into the receiver's segment.
    Put,
    /// The receiver reads from the sender's segment.
    Get,
}

/// Family of section shapes swept by a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pattern {
    /// One block growing from 1 element to the maximum.
    Contiguous,
    /// Blocks tiling the array, doubling in number while halving in size.
    Many,
    /// As `Many`, with every other half-stride left untouched.
    StridedMany,
    /// Single elements at a stride shrinking from the maximum stride to 1.
    Strided,
}

/// How a section is split into individual one-sided operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    /// One operation for the whole section.
    Whole,
    /// One operation per block.
    PerBlock,
    /// One operation per element.
    PerElement,
}

/// Synchronisation between the ping and the pong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
    /// Barrier over all images.
    All,
    /// `sync images` between the two partners only.
    Pt2pt,
}

impl SyncMode {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            SyncMode::All => "sync all",
            SyncMode::Pt2pt => "sync images",
        }
    }
}

/// Transfer variant measured by a ping-pong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Whole section in one put.
    Put,
    /// One put per block.
    SubPut,
    /// Tiled blocks, one put per block.
    ManyPut,
    /// Tiled blocks in one put.
    SubManyPut,
    /// Tiled blocks, one put per element.
    ManySubPut,
    /// Strided elements in one put.
    StridedPut,
    /// Strided elements, one put each.
    StridedSubPut,
    /// Whole array, reallocated to the section size.
    AllPut,
    /// Contiguous section, one put per element.
    SimpleSubPut,
    /// Half-filled tiles in one put.
    StridedManyPut,
    /// Whole section in one get.
    Get,
    /// One get per block.
    SubGet,
    /// Tiled blocks, one get per block.
    ManyGet,
    /// Tiled blocks in one get.
    SubManyGet,
    /// Tiled blocks, one get per element.
    ManySubGet,
    /// Strided elements in one get.
    StridedGet,
    /// Strided elements, one get each.
    StridedSubGet,
    /// Whole array, reallocated to the section size.
    AllGet,
    /// Contiguous section, one get per element.
    SimpleSubGet,
    /// Half-filled tiles in one get.
    StridedManyGet,
}

impl Mode {
    /// Every mode, puts first.
    pub const ALL: [Mode; 20] = [
        Mode::Put,
        Mode::SubPut,
        Mode::ManyPut,
        Mode::SubManyPut,
        Mode::ManySubPut,
        Mode::StridedPut,
        Mode::StridedSubPut,
        Mode::AllPut,
        Mode::SimpleSubPut,
        Mode::StridedManyPut,
        Mode::Get,
        Mode::SubGet,
        Mode::ManyGet,
        Mode::SubManyGet,
        Mode::ManySubGet,
        Mode::StridedGet,
        Mode::StridedSubGet,
        Mode::AllGet,
        Mode::SimpleSubGet,
        Mode::StridedManyGet,
    ];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Mode::Put => "put",
            Mode::SubPut => "subput",
            Mode::ManyPut => "many put",
            Mode::SubManyPut => "sub manyput",
            Mode::ManySubPut => "many subput",
            Mode::StridedPut => "strided put",
            Mode::StridedSubPut => "strided subput",
            Mode::AllPut => "all put",
            Mode::SimpleSubPut => "simple subput",
            Mode::StridedManyPut => "strided many put",
            Mode::Get => "get",
            Mode::SubGet => "subget",
            Mode::ManyGet => "many get",
            Mode::SubManyGet => "sub manyget",
            Mode::ManySubGet => "many subget",
            Mode::StridedGet => "strided get",
            Mode::StridedSubGet => "strided subget",
            Mode::AllGet => "all get",
            Mode::SimpleSubGet => "simple subget",
            Mode::StridedManyGet => "strided many get",
        }
    }

    /// Whether data is put or got.
    pub fn direction(self) -> Direction {
        match self {
            Mode::Put
            | Mode::SubPut
            | Mode::ManyPut
            | Mode::SubManyPut
            | Mode::ManySubPut
            | Mode::StridedPut
            | Mode::StridedSubPut
            | Mode::AllPut
            | Mode::SimpleSubPut
            | Mode::StridedManyPut => Direction::Put,
            _ => Direction::Get,
        }
    }

    /// Section shapes swept.
    pub fn pattern(self) -> Pattern {
        match self {
            Mode::Put
            | Mode::SubPut
            | Mode::AllPut
            | Mode::SimpleSubPut
            | Mode::Get
            | Mode::SubGet
            | Mode::AllGet
            | Mode::SimpleSubGet => Pattern::Contiguous,
            Mode::ManyPut
            | Mode::SubManyPut
            | Mode::ManySubPut
            | Mode::ManyGet
            | Mode::SubManyGet
            | Mode::ManySubGet => Pattern::Many,
            Mode::StridedManyPut | Mode::StridedManyGet => Pattern::StridedMany,
            Mode::StridedPut | Mode::StridedSubPut | Mode::StridedGet | Mode::StridedSubGet => {
                Pattern::Strided
            }
        }
    }

    /// One-sided operations issued per section.
    pub fn granularity(self) -> Granularity {
        match self {
            Mode::Put
            | Mode::AllPut
            | Mode::SubManyPut
            | Mode::StridedPut
            | Mode::StridedManyPut
            | Mode::Get
            | Mode::AllGet
            | Mode::SubManyGet
            | Mode::StridedGet
            | Mode::StridedManyGet => Granularity::Whole,
            Mode::SubPut
            | Mode::ManyPut
            | Mode::StridedSubPut
            | Mode::SubGet
            | Mode::ManyGet
            | Mode::StridedSubGet => Granularity::PerBlock,
            Mode::SimpleSubPut | Mode::ManySubPut | Mode::SimpleSubGet | Mode::ManySubGet => {
                Granularity::PerElement
            }
        }
    }

    /// Whether the array is reallocated to exactly the section size.
    pub fn reallocates(self) -> bool {
        matches!(self, Mode::AllPut | Mode::AllGet)
    }
}

impl Pattern {
    /// Section shapes for an array of `nmax` elements, in sweep order.
    pub fn sweep(self, nmax: usize, max_stride: usize) -> Vec<Layout> {
        let mut layouts = Vec::new();
        match self {
            Pattern::Contiguous => {
                let mut blksize = 1;
                while blksize <= nmax {
                    layouts.push(Layout::new(1, blksize, 1));
                    blksize *= 2;
                }
            }
            Pattern::Many | Pattern::StridedMany => {
                let (mut count, mut blksize, mut stride) = match self {
                    Pattern::Many => (1, nmax, nmax),
                    _ => (1, nmax / 2, nmax),
                };
                while blksize >= 1 {
                    layouts.push(Layout::new(count, blksize, stride));
                    count *= 2;
                    blksize /= 2;
                    stride /= 2;
                }
            }
            Pattern::Strided => {
                let max_stride = max_stride.max(1);
                let count = nmax / max_stride;
                let mut stride = max_stride;
                while stride >= 1 && count >= 1 {
                    layouts.push(Layout::new(count, 1, stride));
                    stride /= 2;
                }
            }
        }
        layouts
    }
}
