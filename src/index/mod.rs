// src/index/mod.rs
//! Chunk index: the mapping from chunk-grid coordinates to physical
//! storage locations.
//!
//! The index is built once from normalized `(coord, location, length)`
//! tuples (parsed from a sidecar document or queried from the native
//! format library, both outside this crate) and is immutable afterwards,
//! so it can be shared by reference across any number of concurrent
//! requests without locking.

mod entry;

pub use entry::{ChunkIndexEntry, StorageLocation};

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::descriptor::VariableDescriptor;
use crate::error::{NdChunkError, Result};
use crate::filter;
use crate::hyperslab::HyperslabRequest;
use crate::odometer::{Coord, Odometer};

/// All stored chunks of one variable.
///
/// Absence of a coordinate is not an error: it means the chunk was never
/// written and reads must substitute the variable's fill value.
#[derive(Debug, Clone)]
pub struct ChunkIndex {
    entries: HashMap<Coord, ChunkIndexEntry>,
    chunk_shape: SmallVec<[u64; 4]>,
    grid_shape: SmallVec<[u64; 4]>,
}

impl ChunkIndex {
    /// Build the index in one pass over `entries`.
    ///
    /// Fails with a `Config` error when two entries share a coordinate,
    /// when a coordinate falls outside the chunk grid implied by the
    /// descriptor, or when an entry's declared encoded length cannot be
    /// right for the variable's filter pipeline (with no size-changing
    /// filter, every chunk must be stored at exactly the decoded chunk
    /// byte size).
    pub fn build(descriptor: &VariableDescriptor, entries: Vec<ChunkIndexEntry>) -> Result<Self> {
        let grid_shape = descriptor.chunk_grid_shape();
        let size_preserving = filter::is_size_preserving(descriptor.filters());
        let chunk_bytes = descriptor.chunk_byte_size();

        let mut map = HashMap::with_capacity(entries.len());
        for entry in entries {
            if entry.coord.len() != grid_shape.len() {
                return Err(NdChunkError::RankMismatch {
                    shape: grid_shape.len(),
                    what: "chunk coordinate",
                    got: entry.coord.len(),
                });
            }
            if entry
                .coord
                .iter()
                .zip(grid_shape.iter())
                .any(|(&c, &g)| c >= g)
            {
                return Err(NdChunkError::ChunkOutsideGrid {
                    coord: entry.coord.to_vec(),
                    grid: grid_shape.to_vec(),
                });
            }
            if size_preserving && entry.length != chunk_bytes {
                return Err(NdChunkError::EncodedLengthMismatch {
                    coord: entry.coord.to_vec(),
                    declared: entry.length,
                    expected: chunk_bytes,
                });
            }
            if let Some(previous) = map.insert(entry.coord.clone(), entry) {
                return Err(NdChunkError::DuplicateChunk {
                    coord: previous.coord.to_vec(),
                });
            }
        }

        Ok(ChunkIndex {
            entries: map,
            chunk_shape: descriptor.chunk_shape().iter().copied().collect(),
            grid_shape,
        })
    }

    /// Number of chunks actually stored (missing chunks are implicit).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn grid_shape(&self) -> &[u64] {
        &self.grid_shape
    }

    /// Look up the entry for a chunk-grid coordinate. `None` means the
    /// chunk was never written; the caller substitutes the fill value
    /// rather than attempting a fetch.
    pub fn lookup(&self, coord: &[u64]) -> Option<&ChunkIndexEntry> {
        self.entries.get(&Coord::from_slice(coord))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChunkIndexEntry> {
        self.entries.values()
    }

    /// Odometer over the chunk-grid coordinates whose chunks intersect
    /// the hyperslab: per dimension, `start / chunk_extent` through
    /// `stop / chunk_extent` inclusive.
    ///
    /// This is the only place element coordinates convert to chunk-grid
    /// coordinates. The hyperslab must already be validated against the
    /// variable's shape.
    pub fn overlapping_chunk_coords(&self, slab: &HyperslabRequest) -> Odometer {
        debug_assert_eq!(slab.rank(), self.chunk_shape.len());

        let mut origin: SmallVec<[u64; 4]> = SmallVec::with_capacity(slab.rank());
        let mut extents: SmallVec<[u64; 4]> = SmallVec::with_capacity(slab.rank());
        for (range, &chunk_extent) in slab.dims().iter().zip(self.chunk_shape.iter()) {
            let first = range.start / chunk_extent;
            let last = range.stop / chunk_extent;
            origin.push(first);
            extents.push(last - first + 1);
        }
        Odometer::with_origin(&origin, &extents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hyperslab::DimRange;
    use crate::types::{ByteOrder, ElementType};

    fn descriptor() -> VariableDescriptor {
        VariableDescriptor::unfiltered(&[4, 8], &[2, 4], ElementType::Float32, ByteOrder::Little)
            .unwrap()
    }

    fn entries() -> Vec<ChunkIndexEntry> {
        vec![
            ChunkIndexEntry::local(&[0, 0], 0, 32),
            ChunkIndexEntry::local(&[0, 1], 32, 32),
            ChunkIndexEntry::local(&[1, 0], 64, 32),
            ChunkIndexEntry::local(&[1, 1], 96, 32),
        ]
    }

    #[test]
    fn test_build_and_lookup() {
        let index = ChunkIndex::build(&descriptor(), entries()).unwrap();
        assert_eq!(index.len(), 4);
        assert_eq!(index.grid_shape(), &[2, 2]);

        let entry = index.lookup(&[1, 0]).unwrap();
        assert_eq!(entry.location.offset(), 64);
        assert!(index.lookup(&[2, 0]).is_none());
    }

    #[test]
    fn test_build_rejects_duplicates() {
        let mut e = entries();
        e.push(ChunkIndexEntry::local(&[0, 0], 128, 32));
        let err = ChunkIndex::build(&descriptor(), e).unwrap_err();
        assert!(matches!(err, NdChunkError::DuplicateChunk { .. }));
    }

    #[test]
    fn test_build_rejects_out_of_grid_coord() {
        let e = vec![ChunkIndexEntry::local(&[2, 0], 0, 32)];
        let err = ChunkIndex::build(&descriptor(), e).unwrap_err();
        assert!(matches!(err, NdChunkError::ChunkOutsideGrid { .. }));
    }

    #[test]
    fn test_build_rejects_wrong_length_when_unfiltered() {
        let e = vec![ChunkIndexEntry::local(&[0, 0], 0, 30)];
        let err = ChunkIndex::build(&descriptor(), e).unwrap_err();
        assert!(matches!(err, NdChunkError::EncodedLengthMismatch { .. }));
    }

    #[test]
    fn test_build_accepts_any_length_when_compressed() {
        let d = VariableDescriptor::new(
            &[4, 8],
            &[2, 4],
            ElementType::Float32,
            ByteOrder::Little,
            crate::types::FillValue::zero(ElementType::Float32),
            vec!["deflate".to_string()],
        )
        .unwrap();
        let e = vec![ChunkIndexEntry::local(&[0, 0], 0, 11)];
        assert!(ChunkIndex::build(&d, e).is_ok());
    }

    #[test]
    fn test_overlapping_chunk_coords() {
        let index = ChunkIndex::build(&descriptor(), entries()).unwrap();

        // Rows 1..=2, cols 2..=5 touch all four chunks.
        let slab = HyperslabRequest::new(vec![DimRange::span(1, 2), DimRange::span(2, 5)]);
        let coords: Vec<_> = index.overlapping_chunk_coords(&slab).collect();
        assert_eq!(coords.len(), 4);
        assert_eq!(coords[0].as_slice(), &[0, 0]);
        assert_eq!(coords[3].as_slice(), &[1, 1]);

        // A single element touches exactly one chunk.
        let slab = HyperslabRequest::new(vec![DimRange::span(3, 3), DimRange::span(7, 7)]);
        let coords: Vec<_> = index.overlapping_chunk_coords(&slab).collect();
        assert_eq!(coords.len(), 1);
        assert_eq!(coords[0].as_slice(), &[1, 1]);
    }
}
