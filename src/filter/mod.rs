// src/filter/mod.rs
//! Filter pipeline: reverses the write-time transforms on one chunk.
//!
//! Filters are named, pure byte transforms. A variable's metadata lists
//! them in write order (e.g. `shuffle` then `deflate`); decoding applies
//! the inverses in strict LIFO order, so the same list drives both
//! directions. A damaged chunk fails the whole decode; there is no
//! best-effort output.

mod deflate;
mod shuffle;

pub use deflate::DeflateFilter;
pub use shuffle::ShuffleFilter;

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use log::trace;

use crate::error::{NdChunkError, Result};

/// Per-chunk decode parameters shared by every stage.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext {
    /// Final decoded size of the chunk in bytes
    /// (chunk-shape-product x element-size).
    pub decoded_size: usize,
    /// Width of one element in bytes; the shuffle inverse needs it.
    pub element_size: usize,
}

/// A named, invertible byte transform. Only the read direction lives
/// here; chunk creation is outside this crate.
pub trait Filter: Send + Sync {
    fn name(&self) -> &str;

    /// Whether encoded and decoded byte lengths are always equal. The
    /// index uses this to validate declared chunk lengths at build time.
    fn is_size_preserving(&self) -> bool;

    /// Reverse the write-time transform on one chunk's bytes.
    fn decode(&self, input: Bytes, ctx: &FilterContext) -> Result<Bytes>;
}

/// Pass-through filter, for variables that declare a stage the engine
/// should treat as a no-op.
pub struct IdentityFilter;

impl Filter for IdentityFilter {
    fn name(&self) -> &str {
        "identity"
    }

    fn is_size_preserving(&self) -> bool {
        true
    }

    fn decode(&self, input: Bytes, _ctx: &FilterContext) -> Result<Bytes> {
        Ok(input)
    }
}

/// Registry of named filters plus the decode driver.
///
/// `FilterPipeline::new()` knows `identity`, `deflate` and `shuffle`;
/// additional codecs register under their own names.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use ndchunk::filter::{FilterContext, FilterPipeline};
///
/// let pipeline = FilterPipeline::new();
/// let ctx = FilterContext { decoded_size: 4, element_size: 4 };
/// let out = pipeline
///     .decode(Bytes::from_static(&[1, 2, 3, 4]), &["identity".into()], &ctx)
///     .unwrap();
/// assert_eq!(&out[..], &[1, 2, 3, 4]);
/// ```
pub struct FilterPipeline {
    filters: HashMap<String, Arc<dyn Filter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        let mut pipeline = FilterPipeline {
            filters: HashMap::new(),
        };
        pipeline.register(Arc::new(IdentityFilter));
        pipeline.register(Arc::new(DeflateFilter));
        pipeline.register(Arc::new(ShuffleFilter));
        pipeline
    }

    /// Register a filter under its own name, replacing any previous
    /// filter of that name.
    pub fn register(&mut self, filter: Arc<dyn Filter>) {
        self.filters.insert(filter.name().to_string(), filter);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Filter>> {
        self.filters.get(name)
    }

    /// Apply the inverses of `names` in reverse write order, then check
    /// the result is exactly `ctx.decoded_size` bytes.
    ///
    /// Unknown filter names and any stage failure surface as `Decode`
    /// errors for the whole chunk.
    pub fn decode(&self, input: Bytes, names: &[String], ctx: &FilterContext) -> Result<Bytes> {
        let mut buf = input;
        for name in names.iter().rev() {
            let filter = self
                .filters
                .get(name.as_str())
                .ok_or_else(|| NdChunkError::UnknownFilter(name.clone()))?;
            trace!("applying inverse of filter '{}' to {} bytes", name, buf.len());
            buf = filter.decode(buf, ctx)?;
        }
        if buf.len() != ctx.decoded_size {
            return Err(NdChunkError::DecodedSizeMismatch {
                expected: ctx.decoded_size,
                actual: buf.len(),
            });
        }
        Ok(buf)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a write-time filter list never changes the byte length. Used
/// by index construction to validate declared chunk lengths; unknown
/// names are conservatively treated as size-changing.
pub fn is_size_preserving(names: &[String]) -> bool {
    names
        .iter()
        .all(|n| matches!(n.as_str(), "identity" | "shuffle"))
}
