// src/retrieve/remote.rs
use bytes::Bytes;
use log::debug;

use crate::error::{NdChunkError, Result};
use crate::index::{ChunkIndexEntry, StorageLocation};

use super::ChunkRetriever;

/// Failure categories a transport reports, letting callers distinguish
/// "retry might help" from "the read is gone".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The resource does not exist.
    NotFound,
    /// Momentary trouble (timeout, 5xx, connection reset); the transport
    /// owner may retry before calling again.
    Transient(String),
    /// Definitive refusal (4xx other than 404, auth failure).
    Permanent(String),
}

/// The single-range fetch the engine consumes. Implemented outside this
/// crate over HTTP range GETs or object-store range reads; an
/// implementation performs whatever retries it wants internally but
/// reports exactly one outcome per call.
pub trait RangeTransport: Send + Sync {
    fn fetch_range(
        &self,
        resource: &str,
        offset: u64,
        length: u64,
    ) -> std::result::Result<Bytes, TransportError>;
}

/// Chunk retriever over a `RangeTransport`. One byte-range request per
/// chunk; anything other than a full-length body is a `RangeRead` error.
pub struct RemoteRetriever<T> {
    transport: T,
}

impl<T: RangeTransport> RemoteRetriever<T> {
    pub fn new(transport: T) -> Self {
        RemoteRetriever { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: RangeTransport> ChunkRetriever for RemoteRetriever<T> {
    fn fetch(&self, entry: &ChunkIndexEntry) -> Result<Bytes> {
        let (resource, offset) = match &entry.location {
            StorageLocation::Remote { resource, offset } => (resource.as_str(), *offset),
            StorageLocation::Local { .. } => {
                return Err(NdChunkError::NoBackend { location: "local" })
            }
        };

        debug!(
            "range request {}..{} on '{}' for chunk {:?}",
            offset,
            offset + entry.length,
            resource,
            entry.coord
        );

        let body = self
            .transport
            .fetch_range(resource, offset, entry.length)
            .map_err(|e| match e {
                TransportError::NotFound => NdChunkError::ResourceNotFound(resource.to_string()),
                TransportError::Transient(msg) => NdChunkError::TransportTransient(msg),
                TransportError::Permanent(msg) => NdChunkError::TransportPermanent(msg),
            })?;

        if (body.len() as u64) < entry.length {
            return Err(NdChunkError::ShortRead {
                expected: entry.length,
                actual: body.len() as u64,
            });
        }
        // Tolerate a transport handing back more than asked (e.g. a
        // whole-object response); the chunk is the leading range.
        Ok(body.slice(..entry.length as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapTransport(HashMap<String, Bytes>);

    impl RangeTransport for MapTransport {
        fn fetch_range(
            &self,
            resource: &str,
            offset: u64,
            length: u64,
        ) -> std::result::Result<Bytes, TransportError> {
            let data = self.0.get(resource).ok_or(TransportError::NotFound)?;
            let start = offset as usize;
            let end = (offset + length) as usize;
            if end > data.len() {
                return Ok(data.slice(start.min(data.len())..));
            }
            Ok(data.slice(start..end))
        }
    }

    fn transport() -> MapTransport {
        let mut map = HashMap::new();
        map.insert("bucket/a".to_string(), Bytes::from_static(&[1, 2, 3, 4, 5, 6]));
        MapTransport(map)
    }

    #[test]
    fn test_range_fetch() {
        let retriever = RemoteRetriever::new(transport());
        let entry = ChunkIndexEntry::remote(&[0], "bucket/a", 2, 3);
        assert_eq!(&retriever.fetch(&entry).unwrap()[..], &[3, 4, 5]);
    }

    #[test]
    fn test_not_found_maps_to_resource_not_found() {
        let retriever = RemoteRetriever::new(transport());
        let entry = ChunkIndexEntry::remote(&[0], "bucket/nope", 0, 1);
        assert!(matches!(
            retriever.fetch(&entry).unwrap_err(),
            NdChunkError::ResourceNotFound(_)
        ));
    }

    #[test]
    fn test_short_body_is_range_read_error() {
        let retriever = RemoteRetriever::new(transport());
        let entry = ChunkIndexEntry::remote(&[0], "bucket/a", 4, 10);
        assert!(matches!(
            retriever.fetch(&entry).unwrap_err(),
            NdChunkError::ShortRead { .. }
        ));
    }

    #[test]
    fn test_local_entry_has_no_backend() {
        let retriever = RemoteRetriever::new(transport());
        let entry = ChunkIndexEntry::local(&[0], 0, 1);
        assert!(matches!(
            retriever.fetch(&entry).unwrap_err(),
            NdChunkError::NoBackend { location: "local" }
        ));
    }

    #[test]
    fn test_transient_and_permanent_categories() {
        struct Failing(TransportError);
        impl RangeTransport for Failing {
            fn fetch_range(
                &self,
                _: &str,
                _: u64,
                _: u64,
            ) -> std::result::Result<Bytes, TransportError> {
                Err(self.0.clone())
            }
        }

        let entry = ChunkIndexEntry::remote(&[0], "r", 0, 1);

        let retriever = RemoteRetriever::new(Failing(TransportError::Transient("503".into())));
        let err = retriever.fetch(&entry).unwrap_err();
        assert!(err.is_transient());

        let retriever = RemoteRetriever::new(Failing(TransportError::Permanent("403".into())));
        let err = retriever.fetch(&entry).unwrap_err();
        assert!(!err.is_transient());
        assert!(matches!(err, NdChunkError::TransportPermanent(_)));
    }
}
