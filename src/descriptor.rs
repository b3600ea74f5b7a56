// src/descriptor.rs
use smallvec::SmallVec;

use crate::error::{NdChunkError, Result};
use crate::types::{ByteOrder, ElementType, FillValue};

/// Immutable description of one chunked array variable: its logical
/// shape, chunk shape, element type, byte order, fill value, and the
/// ordered list of write-time filters.
///
/// Built once when the variable's metadata is resolved, then shared by
/// reference across all subsequent reads.
#[derive(Debug, Clone)]
pub struct VariableDescriptor {
    shape: SmallVec<[u64; 4]>,
    chunk_shape: SmallVec<[u64; 4]>,
    element: ElementType,
    byte_order: ByteOrder,
    fill_value: FillValue,
    filters: Vec<String>,
}

impl VariableDescriptor {
    /// Validates that the chunk shape has the same rank as the logical
    /// shape, that no extent is zero, and that the fill value is exactly
    /// one element wide. All violations are `Config` errors.
    pub fn new(
        shape: &[u64],
        chunk_shape: &[u64],
        element: ElementType,
        byte_order: ByteOrder,
        fill_value: FillValue,
        filters: Vec<String>,
    ) -> Result<Self> {
        if chunk_shape.len() != shape.len() {
            return Err(NdChunkError::RankMismatch {
                shape: shape.len(),
                what: "chunk shape",
                got: chunk_shape.len(),
            });
        }
        for (dim, &extent) in shape.iter().enumerate() {
            if extent == 0 {
                return Err(NdChunkError::ZeroExtent { dim });
            }
        }
        for (dim, &extent) in chunk_shape.iter().enumerate() {
            if extent == 0 {
                return Err(NdChunkError::ZeroExtent { dim });
            }
        }
        fill_value.check_width(element)?;

        Ok(VariableDescriptor {
            shape: shape.iter().copied().collect(),
            chunk_shape: chunk_shape.iter().copied().collect(),
            element,
            byte_order,
            fill_value,
            filters,
        })
    }

    /// Uncompressed variable with a zero fill value.
    pub fn unfiltered(
        shape: &[u64],
        chunk_shape: &[u64],
        element: ElementType,
        byte_order: ByteOrder,
    ) -> Result<Self> {
        Self::new(
            shape,
            chunk_shape,
            element,
            byte_order,
            FillValue::zero(element),
            Vec::new(),
        )
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    pub fn chunk_shape(&self) -> &[u64] {
        &self.chunk_shape
    }

    pub fn element(&self) -> ElementType {
        self.element
    }

    pub fn element_size(&self) -> usize {
        self.element.size()
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Write-time filter order; decode reverses it.
    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    /// Elements in one (full-size) chunk. Edge chunks are stored at this
    /// size too, with the out-of-bounds region padded.
    pub fn chunk_elements(&self) -> u64 {
        self.chunk_shape.iter().product()
    }

    /// Decoded byte size of one chunk.
    pub fn chunk_byte_size(&self) -> u64 {
        self.chunk_elements() * self.element.size() as u64
    }

    /// Shape of the chunk grid: per dimension, how many chunks cover the
    /// logical extent (rounding up for partial edge chunks).
    pub fn chunk_grid_shape(&self) -> SmallVec<[u64; 4]> {
        self.shape
            .iter()
            .zip(self.chunk_shape.iter())
            .map(|(&s, &c)| s.div_ceil(c))
            .collect()
    }
}
