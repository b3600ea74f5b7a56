// src/error.rs
use std::io;
use thiserror::Error;

/// Broad failure category, used by callers that only need to decide
/// between "reject the variable", "reject the request", "retryable
/// transport trouble" and "the data itself is damaged".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Variable or index is malformed; reject at registration time.
    Config,
    /// Hyperslab request is invalid; rejected before any I/O.
    Constraint,
    /// A byte-range read failed or came up short.
    RangeRead,
    /// The filter pipeline detected corruption or a size mismatch.
    Decode,
}

#[derive(Error, Debug)]
pub enum NdChunkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("duplicate chunk coordinate {coord:?} in index")]
    DuplicateChunk { coord: Vec<u64> },

    #[error("chunk coordinate {coord:?} outside chunk grid {grid:?}")]
    ChunkOutsideGrid { coord: Vec<u64>, grid: Vec<u64> },

    #[error("chunk at {coord:?} declares {declared} encoded bytes, expected {expected}")]
    EncodedLengthMismatch {
        coord: Vec<u64>,
        declared: u64,
        expected: u64,
    },

    #[error("rank mismatch: shape has {shape} dimensions, {what} has {got}")]
    RankMismatch {
        shape: usize,
        what: &'static str,
        got: usize,
    },

    #[error("dimension {dim} has zero extent")]
    ZeroExtent { dim: usize },

    #[error("fill value is {got} bytes, element type needs {expected}")]
    FillValueWidth { got: usize, expected: usize },

    #[error("dimension {dim}: stride must be positive")]
    ZeroStride { dim: usize },

    #[error("dimension {dim}: start {start} is past stop {stop}")]
    StartPastStop { dim: usize, start: u64, stop: u64 },

    #[error("dimension {dim}: stop {stop} outside extent {extent}")]
    StopOutOfBounds { dim: usize, stop: u64, extent: u64 },

    #[error("short read: wanted {expected} bytes, got {actual}")]
    ShortRead { expected: u64, actual: u64 },

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("transient transport failure: {0}")]
    TransportTransient(String),

    #[error("permanent transport failure: {0}")]
    TransportPermanent(String),

    #[error("no retriever backend for {location} chunk storage")]
    NoBackend { location: &'static str },

    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    #[error("corrupt chunk stream in filter '{filter}': {detail}")]
    CorruptStream { filter: String, detail: String },

    #[error("decoded chunk is {actual} bytes, expected {expected}")]
    DecodedSizeMismatch { expected: usize, actual: usize },

    #[error("shuffle filter: {len} bytes is not a multiple of element width {width}")]
    BadShuffleWidth { len: usize, width: usize },

    #[error("buffer of {len} bytes is not a whole number of {width}-byte elements")]
    ElementCast { len: usize, width: usize },

    #[error("worker pool failed: {0}")]
    WorkerPanic(String),
}

impl NdChunkError {
    /// Map a concrete failure onto the coarse taxonomy.
    ///
    /// `WorkerPanic` classifies as `RangeRead`: a worker that dies mid
    /// request means its chunk reads never completed, and the caller's
    /// recourse (retry the request, possibly on the sequential driver)
    /// is the same as for any other failed read.
    pub fn kind(&self) -> ErrorKind {
        use NdChunkError::*;
        match self {
            DuplicateChunk { .. }
            | ChunkOutsideGrid { .. }
            | EncodedLengthMismatch { .. }
            | RankMismatch { .. }
            | ZeroExtent { .. }
            | FillValueWidth { .. } => ErrorKind::Config,

            ZeroStride { .. } | StartPastStop { .. } | StopOutOfBounds { .. } => {
                ErrorKind::Constraint
            }

            Io(_)
            | ShortRead { .. }
            | ResourceNotFound(_)
            | TransportTransient(_)
            | TransportPermanent(_)
            | NoBackend { .. }
            | WorkerPanic(_) => ErrorKind::RangeRead,

            UnknownFilter(_)
            | CorruptStream { .. }
            | DecodedSizeMismatch { .. }
            | BadShuffleWidth { .. }
            | ElementCast { .. } => ErrorKind::Decode,
        }
    }

    /// True when the transport collaborator may usefully retry the
    /// operation that produced this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, NdChunkError::TransportTransient(_))
    }
}

pub type Result<T> = std::result::Result<T, NdChunkError>;
