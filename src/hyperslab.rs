// src/hyperslab.rs
use smallvec::SmallVec;

use crate::error::{NdChunkError, Result};
use crate::odometer::Coord;

/// One dimension of a hyperslab: `start`, `stride`, `stop`, with `stop`
/// inclusive. Selects the positions `start, start+stride, ...` up to and
/// including the last one not past `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimRange {
    pub start: u64,
    pub stride: u64,
    pub stop: u64,
}

impl DimRange {
    pub fn new(start: u64, stride: u64, stop: u64) -> Self {
        DimRange {
            start,
            stride,
            stop,
        }
    }

    /// Contiguous range with stride 1.
    pub fn span(start: u64, stop: u64) -> Self {
        DimRange {
            start,
            stride: 1,
            stop,
        }
    }

    /// Number of selected positions. Only meaningful once validated
    /// (`stride > 0`, `start <= stop`).
    pub fn count(&self) -> u64 {
        (self.stop - self.start) / self.stride + 1
    }
}

/// A validated-on-demand rectangular, possibly strided subset of an
/// array's logical index space.
///
/// Built per request, validated against the variable's shape before any
/// I/O, and read-only afterwards.
///
/// # Example
///
/// ```
/// use ndchunk::hyperslab::{DimRange, HyperslabRequest};
///
/// // Rows 1..=2, columns 2..=5 of a [4, 8] array.
/// let slab = HyperslabRequest::new(vec![
///     DimRange::span(1, 2),
///     DimRange::span(2, 5),
/// ]);
/// slab.validate(&[4, 8]).unwrap();
/// assert_eq!(slab.counts().as_slice(), &[2, 4]);
/// assert_eq!(slab.output_elements(), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperslabRequest {
    dims: SmallVec<[DimRange; 4]>,
}

impl HyperslabRequest {
    pub fn new(dims: impl IntoIterator<Item = DimRange>) -> Self {
        HyperslabRequest {
            dims: dims.into_iter().collect(),
        }
    }

    /// The unconstrained request: every position of every dimension.
    pub fn whole(shape: &[u64]) -> Self {
        HyperslabRequest {
            dims: shape
                .iter()
                .map(|&extent| DimRange::span(0, extent.saturating_sub(1)))
                .collect(),
        }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[DimRange] {
        &self.dims
    }

    /// Reject rank mismatches, zero strides, reversed ranges, and bounds
    /// violations. Called by the assembler before touching storage.
    pub fn validate(&self, shape: &[u64]) -> Result<()> {
        if self.dims.len() != shape.len() {
            return Err(NdChunkError::RankMismatch {
                shape: shape.len(),
                what: "hyperslab",
                got: self.dims.len(),
            });
        }
        for (dim, (range, &extent)) in self.dims.iter().zip(shape.iter()).enumerate() {
            if range.stride == 0 {
                return Err(NdChunkError::ZeroStride { dim });
            }
            if range.start > range.stop {
                return Err(NdChunkError::StartPastStop {
                    dim,
                    start: range.start,
                    stop: range.stop,
                });
            }
            if range.stop >= extent {
                return Err(NdChunkError::StopOutOfBounds {
                    dim,
                    stop: range.stop,
                    extent,
                });
            }
        }
        Ok(())
    }

    /// Selected positions per dimension.
    pub fn counts(&self) -> Coord {
        self.dims.iter().map(|d| d.count()).collect()
    }

    /// Total elements in the assembled output buffer.
    pub fn output_elements(&self) -> u64 {
        self.dims.iter().map(|d| d.count()).product()
    }
}
