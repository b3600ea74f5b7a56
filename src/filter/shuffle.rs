// src/filter/shuffle.rs
use bytes::Bytes;

use crate::error::{NdChunkError, Result};

use super::{Filter, FilterContext};

/// Inverse of the HDF5 byte-shuffle filter.
///
/// The write-time shuffle groups the i-th byte of every element
/// together (all byte-0s, then all byte-1s, ...) so a following
/// compressor sees longer runs. Decoding re-interleaves them. Written
/// shuffle-then-deflate, read deflate-then-unshuffle.
pub struct ShuffleFilter;

impl Filter for ShuffleFilter {
    fn name(&self) -> &str {
        "shuffle"
    }

    fn is_size_preserving(&self) -> bool {
        true
    }

    fn decode(&self, input: Bytes, ctx: &FilterContext) -> Result<Bytes> {
        let width = ctx.element_size;
        if width <= 1 {
            return Ok(input);
        }
        if input.len() % width != 0 {
            return Err(NdChunkError::BadShuffleWidth {
                len: input.len(),
                width,
            });
        }

        let count = input.len() / width;
        let mut out = vec![0u8; input.len()];
        for byte_index in 0..width {
            let plane = &input[byte_index * count..(byte_index + 1) * count];
            for (elem, &b) in plane.iter().enumerate() {
                out[elem * width + byte_index] = b;
            }
        }
        Ok(out.into())
    }
}
