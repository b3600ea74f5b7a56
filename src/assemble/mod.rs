// src/assemble/mod.rs
//! Drives Odometer + ChunkIndex + ChunkRetriever + FilterPipeline to
//! fill a requested hyperslab.
//!
//! The result is a raw byte buffer of exactly `prod(count_i)` elements
//! in row-major hyperslab order and the variable's native byte order.
//! Every output position is written by exactly one chunk's copy (or
//! fill) runs, so chunk processing order never affects the result and
//! the parallel drivers need no cross-chunk synchronization.

pub(crate) mod plan;

mod parallel;

#[cfg(feature = "async")]
mod async_assemble;

#[cfg(feature = "async")]
pub use async_assemble::AsyncArrayAssembler;

use bytes::Bytes;
use log::debug;

use crate::descriptor::VariableDescriptor;
use crate::error::Result;
use crate::filter::{FilterContext, FilterPipeline};
use crate::hyperslab::HyperslabRequest;
use crate::index::{ChunkIndex, ChunkIndexEntry};
use crate::retrieve::ChunkRetriever;

use plan::{apply_copy_runs, apply_fill_runs, chunk_plan, copy_runs, fill_runs};

/// Assembles hyperslab reads over one retriever and one filter
/// pipeline. The descriptor and index arrive per call, so a single
/// assembler serves every variable reachable through its retriever.
///
/// # Example
///
/// ```
/// use ndchunk::assemble::ArrayAssembler;
/// use ndchunk::descriptor::VariableDescriptor;
/// use ndchunk::hyperslab::HyperslabRequest;
/// use ndchunk::index::{ChunkIndex, ChunkIndexEntry};
/// use ndchunk::retrieve::MemoryRetriever;
/// use ndchunk::types::{ByteOrder, ElementType};
///
/// // A [2, 2] u8 variable stored as one chunk of four bytes.
/// let descriptor = VariableDescriptor::unfiltered(
///     &[2, 2], &[2, 2], ElementType::UInt8, ByteOrder::Little,
/// ).unwrap();
/// let index = ChunkIndex::build(
///     &descriptor,
///     vec![ChunkIndexEntry::local(&[0, 0], 0, 4)],
/// ).unwrap();
///
/// let assembler = ArrayAssembler::new(MemoryRetriever::new(vec![1u8, 2, 3, 4]));
/// let out = assembler
///     .assemble(&descriptor, &index, &HyperslabRequest::whole(&[2, 2]))
///     .unwrap();
/// assert_eq!(out, vec![1, 2, 3, 4]);
/// ```
pub struct ArrayAssembler<R> {
    retriever: R,
    pipeline: FilterPipeline,
}

impl<R: ChunkRetriever> ArrayAssembler<R> {
    /// Assembler with the built-in filter set.
    pub fn new(retriever: R) -> Self {
        ArrayAssembler {
            retriever,
            pipeline: FilterPipeline::new(),
        }
    }

    /// Assembler with a caller-supplied pipeline (custom codecs).
    pub fn with_pipeline(retriever: R, pipeline: FilterPipeline) -> Self {
        ArrayAssembler {
            retriever,
            pipeline,
        }
    }

    pub fn pipeline_mut(&mut self) -> &mut FilterPipeline {
        &mut self.pipeline
    }

    /// Fill the hyperslab sequentially, one chunk at a time.
    ///
    /// Validation happens before any I/O; any fetch or decode failure
    /// aborts the whole request. Missing chunks cost no fetch and are
    /// painted with the variable's fill value.
    pub fn assemble(
        &self,
        descriptor: &VariableDescriptor,
        index: &ChunkIndex,
        slab: &HyperslabRequest,
    ) -> Result<Vec<u8>> {
        slab.validate(descriptor.shape())?;

        let element_size = descriptor.element_size();
        let counts = slab.counts();
        let mut out = vec![0u8; slab.output_elements() as usize * element_size];

        let mut chunks = index.overlapping_chunk_coords(slab);
        while !chunks.is_exhausted() {
            let coord = chunks.indices();
            let Some(plan) = chunk_plan(slab, descriptor.chunk_shape(), coord) else {
                // Stride stepped over this whole chunk.
                chunks.next();
                continue;
            };

            match index.lookup(coord) {
                None => {
                    let runs = fill_runs(&plan, &counts, element_size);
                    apply_fill_runs(&mut out, descriptor.fill_value().as_bytes(), &runs);
                }
                Some(entry) => {
                    let decoded = self.decode_chunk(descriptor, entry)?;
                    let runs =
                        copy_runs(&plan, slab, descriptor.chunk_shape(), &counts, element_size);
                    apply_copy_runs(&mut out, &decoded, &runs);
                }
            }
            chunks.next();
        }

        Ok(out)
    }

    /// Fetch one chunk and reverse its filters. Decoded output is always
    /// the full chunk byte size; edge chunks are clipped later by the
    /// copy runs, which never address the out-of-bounds region.
    fn decode_chunk(
        &self,
        descriptor: &VariableDescriptor,
        entry: &ChunkIndexEntry,
    ) -> Result<Bytes> {
        let encoded = self.retriever.fetch(entry)?;
        debug!(
            "decoding chunk {:?}: {} -> {} bytes",
            entry.coord,
            encoded.len(),
            descriptor.chunk_byte_size()
        );
        let ctx = FilterContext {
            decoded_size: descriptor.chunk_byte_size() as usize,
            element_size: descriptor.element_size(),
        };
        self.pipeline.decode(encoded, descriptor.filters(), &ctx)
    }
}
