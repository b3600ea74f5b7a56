// src/retrieve/mod.rs
//! Byte-range retrieval of raw (still-encoded) chunk bytes.
//!
//! Every backend performs exactly one logical attempt per call and maps
//! any short read onto a `RangeRead` error. Retry and backoff policy
//! belongs to the transport collaborator behind `RangeTransport`, not
//! here, so failure semantics stay uniform across backing stores.

mod remote;

#[cfg(feature = "mmap")]
mod mmap;

#[cfg(feature = "async")]
mod async_remote;

pub use remote::{RangeTransport, RemoteRetriever, TransportError};

#[cfg(feature = "mmap")]
pub use mmap::MmapRetriever;

#[cfg(feature = "async")]
pub use async_remote::{AsyncChunkRetriever, AsyncRangeTransport, AsyncRemoteRetriever, BlockingRetriever};

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use bytes::Bytes;
use log::debug;
use parking_lot::Mutex;

use crate::error::{NdChunkError, Result};
use crate::index::{ChunkIndexEntry, StorageLocation};

/// Fetches the encoded bytes of one chunk.
pub trait ChunkRetriever: Send + Sync {
    /// Exactly one logical attempt; a short read or transport failure is
    /// a `RangeRead` error, never silently truncated data.
    fn fetch(&self, entry: &ChunkIndexEntry) -> Result<Bytes>;
}

/// Positioned reads from a local container file.
///
/// The file handle is shared behind a mutex; each fetch seeks and reads
/// exactly `entry.length` bytes.
pub struct FileRetriever {
    file: Mutex<File>,
}

impl FileRetriever {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(FileRetriever {
            file: Mutex::new(file),
        })
    }

    pub fn from_file(file: File) -> Self {
        FileRetriever {
            file: Mutex::new(file),
        }
    }
}

impl ChunkRetriever for FileRetriever {
    fn fetch(&self, entry: &ChunkIndexEntry) -> Result<Bytes> {
        let offset = match &entry.location {
            StorageLocation::Local { offset } => *offset,
            StorageLocation::Remote { .. } => {
                return Err(NdChunkError::NoBackend { location: "remote" })
            }
        };

        debug!(
            "fetching {} bytes at offset {} for chunk {:?}",
            entry.length, offset, entry.coord
        );

        let mut buf = vec![0u8; entry.length as usize];
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut read = 0usize;
        while read < buf.len() {
            match file.read(&mut buf[read..])? {
                0 => {
                    return Err(NdChunkError::ShortRead {
                        expected: entry.length,
                        actual: read as u64,
                    })
                }
                n => read += n,
            }
        }
        Ok(buf.into())
    }
}

/// In-memory backend: one local blob plus named remote resources.
/// Serves tests and doc examples; behaves exactly like the file and
/// remote backends with respect to short ranges and missing resources.
#[derive(Default)]
pub struct MemoryRetriever {
    local: Bytes,
    resources: HashMap<String, Bytes>,
}

impl MemoryRetriever {
    pub fn new(local: impl Into<Bytes>) -> Self {
        MemoryRetriever {
            local: local.into(),
            resources: HashMap::new(),
        }
    }

    pub fn with_resource(mut self, name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.resources.insert(name.into(), data.into());
        self
    }

    fn slice(data: &Bytes, offset: u64, length: u64) -> Result<Bytes> {
        let start = offset as usize;
        let end = start.checked_add(length as usize);
        match end {
            Some(end) if end <= data.len() => Ok(data.slice(start..end)),
            _ => Err(NdChunkError::ShortRead {
                expected: length,
                actual: data.len().saturating_sub(start) as u64,
            }),
        }
    }
}

impl ChunkRetriever for MemoryRetriever {
    fn fetch(&self, entry: &ChunkIndexEntry) -> Result<Bytes> {
        match &entry.location {
            StorageLocation::Local { offset } => Self::slice(&self.local, *offset, entry.length),
            StorageLocation::Remote { resource, offset } => {
                let data = self
                    .resources
                    .get(resource)
                    .ok_or_else(|| NdChunkError::ResourceNotFound(resource.clone()))?;
                Self::slice(data, *offset, entry.length)
            }
        }
    }
}

/// Routes local entries to one backend and remote entries to another.
pub struct SplitRetriever<L, R> {
    pub local: L,
    pub remote: R,
}

impl<L: ChunkRetriever, R: ChunkRetriever> ChunkRetriever for SplitRetriever<L, R> {
    fn fetch(&self, entry: &ChunkIndexEntry) -> Result<Bytes> {
        if entry.location.is_remote() {
            self.remote.fetch(entry)
        } else {
            self.local.fetch(entry)
        }
    }
}

impl<T: ChunkRetriever + ?Sized> ChunkRetriever for &T {
    fn fetch(&self, entry: &ChunkIndexEntry) -> Result<Bytes> {
        (**self).fetch(entry)
    }
}

impl<T: ChunkRetriever + ?Sized> ChunkRetriever for std::sync::Arc<T> {
    fn fetch(&self, entry: &ChunkIndexEntry) -> Result<Bytes> {
        (**self).fetch(entry)
    }
}
