// src/filter/deflate.rs
use std::io::Read;

use bytes::Bytes;
use flate2::read::ZlibDecoder;

use crate::error::{NdChunkError, Result};

use super::{Filter, FilterContext};

/// Inflate for the deflate family (zlib streams, as written by the HDF5
/// deflate filter). Reference codec for the pipeline.
pub struct DeflateFilter;

impl Filter for DeflateFilter {
    fn name(&self) -> &str {
        "deflate"
    }

    fn is_size_preserving(&self) -> bool {
        false
    }

    fn decode(&self, input: Bytes, ctx: &FilterContext) -> Result<Bytes> {
        let mut out = Vec::with_capacity(ctx.decoded_size);
        let mut decoder = ZlibDecoder::new(&input[..]);
        decoder
            .read_to_end(&mut out)
            .map_err(|e| NdChunkError::CorruptStream {
                filter: "deflate".to_string(),
                detail: e.to_string(),
            })?;
        Ok(out.into())
    }
}
