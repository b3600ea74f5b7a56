// src/index/entry.rs
use crate::odometer::Coord;

/// Where one chunk's encoded bytes live.
///
/// `Local` is an offset into the container file the index was built for;
/// `Remote` names a resource (object key, URL) plus the offset of the
/// chunk within it. The encoded length lives on the entry, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    Local { offset: u64 },
    Remote { resource: String, offset: u64 },
}

impl StorageLocation {
    pub fn offset(&self) -> u64 {
        match self {
            StorageLocation::Local { offset } => *offset,
            StorageLocation::Remote { offset, .. } => *offset,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, StorageLocation::Remote { .. })
    }
}

/// One stored chunk: its chunk-grid coordinate, storage location, and
/// encoded (still-filtered) byte length. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkIndexEntry {
    pub coord: Coord,
    pub location: StorageLocation,
    pub length: u64,
}

impl ChunkIndexEntry {
    pub fn local(coord: &[u64], offset: u64, length: u64) -> Self {
        ChunkIndexEntry {
            coord: coord.iter().copied().collect(),
            location: StorageLocation::Local { offset },
            length,
        }
    }

    pub fn remote(coord: &[u64], resource: impl Into<String>, offset: u64, length: u64) -> Self {
        ChunkIndexEntry {
            coord: coord.iter().copied().collect(),
            location: StorageLocation::Remote {
                resource: resource.into(),
                offset,
            },
            length,
        }
    }
}
