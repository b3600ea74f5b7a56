// src/assemble/plan.rs
//! Per-chunk copy planning: the intersection, in element-index space, of
//! a hyperslab with one chunk's extent, lowered to byte-copy runs.
//!
//! All three assembler drivers share these plans; a run touches a region
//! of the output buffer no other chunk's runs touch, which is what lets
//! the parallel and async drivers apply results without locking.

use crate::hyperslab::HyperslabRequest;
use crate::odometer::{Coord, Odometer};

/// The samples of a hyperslab that fall inside one chunk.
///
/// `sample_origin[d]` is the index (in the hyperslab's per-dimension
/// sample numbering, i.e. output space) of the first selected position
/// inside the chunk; `sample_extents[d]` how many samples the chunk
/// holds in that dimension; `chunk_origin[d]` the chunk's first element
/// in logical array space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChunkPlan {
    pub sample_origin: Coord,
    pub sample_extents: Coord,
    pub chunk_origin: Coord,
}

/// One contiguous byte copy from a decoded chunk into the output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CopyRun {
    pub src: usize,
    pub dst: usize,
    pub len: usize,
}

/// One contiguous output region to be painted with the fill value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FillRun {
    pub dst: usize,
    pub elements: usize,
}

/// Intersect the hyperslab's sample lattice with the chunk at
/// `chunk_coord`. Returns `None` when the chunk holds no selected
/// sample, which happens for strided requests whose stride steps over
/// the whole chunk; such chunks are skipped before any lookup or fetch.
pub(crate) fn chunk_plan(
    slab: &HyperslabRequest,
    chunk_shape: &[u64],
    chunk_coord: &[u64],
) -> Option<ChunkPlan> {
    let rank = chunk_shape.len();
    let mut sample_origin: Coord = Coord::with_capacity(rank);
    let mut sample_extents: Coord = Coord::with_capacity(rank);
    let mut chunk_origin: Coord = Coord::with_capacity(rank);

    for d in 0..rank {
        let range = slab.dims()[d];
        let origin = chunk_coord[d] * chunk_shape[d];
        let chunk_end = origin + chunk_shape[d]; // exclusive

        // First selected position at or past the chunk origin.
        let lo = origin.max(range.start);
        let k_lo = (lo - range.start).div_ceil(range.stride);
        // Last selected position inside both chunk and request.
        let hi = (chunk_end - 1).min(range.stop);
        if range.start + k_lo * range.stride > hi {
            return None;
        }
        let k_hi = (hi - range.start) / range.stride;

        sample_origin.push(k_lo);
        sample_extents.push(k_hi - k_lo + 1);
        chunk_origin.push(origin);
    }

    Some(ChunkPlan {
        sample_origin,
        sample_extents,
        chunk_origin,
    })
}

/// Lower a plan to byte-copy runs against a decoded (full-size) chunk.
///
/// Output offsets are in hyperslab sample space, so consecutive samples
/// of the last dimension are always contiguous in the output; when the
/// last dimension's stride is 1 the source is contiguous too and the
/// whole innermost lane collapses into a single run.
pub(crate) fn copy_runs(
    plan: &ChunkPlan,
    slab: &HyperslabRequest,
    chunk_shape: &[u64],
    counts: &[u64],
    element_size: usize,
) -> Vec<CopyRun> {
    let rank = chunk_shape.len();
    if rank == 0 {
        return vec![CopyRun {
            src: 0,
            dst: 0,
            len: element_size,
        }];
    }

    let out_strides = Odometer::row_major_strides(counts);
    let chunk_strides = Odometer::row_major_strides(chunk_shape);
    let last = rank - 1;
    let last_range = slab.dims()[last];
    let lane = plan.sample_extents[last] as usize;

    let mut runs = Vec::new();
    // A rank-0 outer box yields exactly one (empty) coordinate, so rank-1
    // plans take a single pass here.
    let mut outer = Odometer::new(&plan.sample_extents[..last]);
    while !outer.is_exhausted() {
        let t = outer.indices();

        let mut dst_elem = plan.sample_origin[last] * out_strides[last];
        let mut src_elem = (last_range.start + plan.sample_origin[last] * last_range.stride
            - plan.chunk_origin[last])
            * chunk_strides[last];
        for d in 0..last {
            let k = plan.sample_origin[d] + t[d];
            let range = slab.dims()[d];
            dst_elem += k * out_strides[d];
            src_elem += (range.start + k * range.stride - plan.chunk_origin[d]) * chunk_strides[d];
        }

        if last_range.stride == 1 {
            runs.push(CopyRun {
                src: src_elem as usize * element_size,
                dst: dst_elem as usize * element_size,
                len: lane * element_size,
            });
        } else {
            for i in 0..lane {
                runs.push(CopyRun {
                    src: (src_elem as usize + i * last_range.stride as usize) * element_size,
                    dst: (dst_elem as usize + i) * element_size,
                    len: element_size,
                });
            }
        }

        outer.next();
    }
    runs
}

/// Lower a plan to fill runs: the same output regions as `copy_runs`,
/// with no source side.
pub(crate) fn fill_runs(plan: &ChunkPlan, counts: &[u64], element_size: usize) -> Vec<FillRun> {
    let rank = counts.len();
    if rank == 0 {
        return vec![FillRun {
            dst: 0,
            elements: 1,
        }];
    }

    let out_strides = Odometer::row_major_strides(counts);
    let last = rank - 1;
    let lane = plan.sample_extents[last] as usize;

    let mut runs = Vec::new();
    let mut outer = Odometer::new(&plan.sample_extents[..last]);
    while !outer.is_exhausted() {
        let t = outer.indices();
        let mut dst_elem = plan.sample_origin[last] * out_strides[last];
        for d in 0..last {
            dst_elem += (plan.sample_origin[d] + t[d]) * out_strides[d];
        }
        runs.push(FillRun {
            dst: dst_elem as usize * element_size,
            elements: lane,
        });
        outer.next();
    }
    runs
}

/// Apply copy runs from a decoded chunk into the output buffer.
pub(crate) fn apply_copy_runs(out: &mut [u8], decoded: &[u8], runs: &[CopyRun]) {
    for run in runs {
        out[run.dst..run.dst + run.len].copy_from_slice(&decoded[run.src..run.src + run.len]);
    }
}

/// Paint fill runs with the element-sized fill pattern.
pub(crate) fn apply_fill_runs(out: &mut [u8], fill: &[u8], runs: &[FillRun]) {
    let width = fill.len();
    for run in runs {
        let start = run.dst;
        for i in 0..run.elements {
            let at = start + i * width;
            out[at..at + width].copy_from_slice(fill);
        }
    }
}
