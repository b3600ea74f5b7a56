// src/lib.rs
//! # ndchunk
//!
//! A chunked N-dimensional array read engine: serve hyperslab requests
//! (per-dimension start/stride/stop) over array variables stored as a
//! grid of independently compressed chunks, without the native format
//! library and without parsing the container on every read.
//!
//! ## Features
//!
//! - 🧭 **Exact addressing**: odometer-driven chunk discovery never
//!   over-fetches and never mis-orders strided output
//! - 🗂️ **Ingested index**: chunk locations come from normalized
//!   `(coord, location, length)` tuples; the container is opened once
//! - 🌐 **Local or remote**: positioned file reads, mmap, or byte-range
//!   requests through a pluggable transport
//! - 🧩 **Pluggable filters**: deflate and byte-shuffle built in, custom
//!   codecs register by name
//! - 🔒 **Share-nothing reads**: the index is immutable after build and
//!   safely shared across unbounded concurrent requests
//! - ⚡ **Three drivers**: sequential, worker-pool parallel, and async
//!   with bounded in-flight fetches
//!
//! ## Quick Start
//!
//! ```rust
//! use ndchunk::prelude::*;
//!
//! fn main() -> Result<()> {
//!     // A [2, 4] u8 variable stored as two [2, 2] chunks.
//!     let descriptor = VariableDescriptor::unfiltered(
//!         &[2, 4], &[2, 2], ElementType::UInt8, ByteOrder::Little,
//!     )?;
//!     let index = ChunkIndex::build(&descriptor, vec![
//!         ChunkIndexEntry::local(&[0, 0], 0, 4),
//!         ChunkIndexEntry::local(&[0, 1], 4, 4),
//!     ])?;
//!
//!     let store = MemoryRetriever::new(vec![0u8, 1, 4, 5, 2, 3, 6, 7]);
//!     let assembler = ArrayAssembler::new(store);
//!
//!     // Row 1 only.
//!     let slab = HyperslabRequest::new(vec![
//!         DimRange::span(1, 1),
//!         DimRange::span(0, 3),
//!     ]);
//!     let out = assembler.assemble(&descriptor, &index, &slab)?;
//!     assert_eq!(out, vec![4, 5, 6, 7]);
//!     Ok(())
//! }
//! ```
//!
//! ## Remote variables
//!
//! Implement [`RangeTransport`](retrieve::RangeTransport) (one HTTP
//! range GET or object-store range read per call; retries live in the
//! transport) and hand a [`RemoteRetriever`](retrieve::RemoteRetriever)
//! to the assembler. With the `async` feature, the same shape exists as
//! [`AsyncRangeTransport`](retrieve::AsyncRangeTransport) plus
//! [`AsyncArrayAssembler`](assemble::AsyncArrayAssembler), which bounds
//! in-flight fetches with a semaphore.

// Modules
pub mod error;
pub mod types;
pub mod descriptor;
pub mod hyperslab;
pub mod odometer;
pub mod index;
pub mod retrieve;
pub mod filter;
pub mod assemble;

// Re-export commonly used types at the crate root for convenience
pub use error::{ErrorKind, NdChunkError, Result};

// Type exports
pub use types::{values_from_bytes, ByteOrder, ElementType, FillValue};

// Descriptor and request exports
pub use descriptor::VariableDescriptor;
pub use hyperslab::{DimRange, HyperslabRequest};

// Index exports
pub use index::{ChunkIndex, ChunkIndexEntry, StorageLocation};

// Coordinate exports
pub use odometer::{Coord, Odometer};

// Retrieval exports
pub use retrieve::{
    ChunkRetriever,
    FileRetriever,
    MemoryRetriever,
    RangeTransport,
    RemoteRetriever,
    SplitRetriever,
    TransportError,
};

#[cfg(feature = "mmap")]
pub use retrieve::MmapRetriever;

#[cfg(feature = "async")]
pub use retrieve::{AsyncChunkRetriever, AsyncRangeTransport, AsyncRemoteRetriever};

// Filter exports
pub use filter::{Filter, FilterContext, FilterPipeline};

// Assembler exports
pub use assemble::ArrayAssembler;

#[cfg(feature = "async")]
pub use assemble::AsyncArrayAssembler;

// Prelude module for glob imports
pub mod prelude {
    //! Convenient imports for common use cases.
    //!
    //! ```rust
    //! use ndchunk::prelude::*;
    //! ```

    pub use crate::assemble::ArrayAssembler;
    pub use crate::descriptor::VariableDescriptor;
    pub use crate::error::{NdChunkError, Result};
    pub use crate::hyperslab::{DimRange, HyperslabRequest};
    pub use crate::index::{ChunkIndex, ChunkIndexEntry, StorageLocation};
    pub use crate::retrieve::{ChunkRetriever, FileRetriever, MemoryRetriever};
    pub use crate::types::{values_from_bytes, ByteOrder, ElementType, FillValue};

    #[cfg(feature = "async")]
    pub use crate::assemble::AsyncArrayAssembler;
}

/// The library version
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");
