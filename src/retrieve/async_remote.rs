// src/retrieve/async_remote.rs
use async_trait::async_trait;
use bytes::Bytes;
use log::debug;

use crate::error::{NdChunkError, Result};
use crate::index::{ChunkIndexEntry, StorageLocation};

use super::{ChunkRetriever, TransportError};

/// Async flavor of the single-range fetch contract.
#[async_trait]
pub trait AsyncRangeTransport: Send + Sync {
    async fn fetch_range(
        &self,
        resource: &str,
        offset: u64,
        length: u64,
    ) -> std::result::Result<Bytes, TransportError>;
}

/// Async chunk retriever, consumed by the async assembler driver.
#[async_trait]
pub trait AsyncChunkRetriever: Send + Sync {
    async fn fetch(&self, entry: &ChunkIndexEntry) -> Result<Bytes>;
}

/// Async chunk retriever over an `AsyncRangeTransport`. Same semantics
/// as the sync `RemoteRetriever`: one request, strict length checking.
pub struct AsyncRemoteRetriever<T> {
    transport: T,
}

impl<T: AsyncRangeTransport> AsyncRemoteRetriever<T> {
    pub fn new(transport: T) -> Self {
        AsyncRemoteRetriever { transport }
    }
}

#[async_trait]
impl<T: AsyncRangeTransport> AsyncChunkRetriever for AsyncRemoteRetriever<T> {
    async fn fetch(&self, entry: &ChunkIndexEntry) -> Result<Bytes> {
        let (resource, offset) = match &entry.location {
            StorageLocation::Remote { resource, offset } => (resource.as_str(), *offset),
            StorageLocation::Local { .. } => {
                return Err(NdChunkError::NoBackend { location: "local" })
            }
        };

        debug!(
            "async range request {}..{} on '{}' for chunk {:?}",
            offset,
            offset + entry.length,
            resource,
            entry.coord
        );

        let body = self
            .transport
            .fetch_range(resource, offset, entry.length)
            .await
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
        Ok(body.slice(..entry.length as usize))
    }
}

/// Adapts any sync retriever to the async contract by fetching inline.
/// Fine for in-memory and mmap backends whose fetches never block on a
/// network.
pub struct BlockingRetriever<R>(pub R);

#[async_trait]
impl<R: ChunkRetriever> AsyncChunkRetriever for BlockingRetriever<R> {
    async fn fetch(&self, entry: &ChunkIndexEntry) -> Result<Bytes> {
        self.0.fetch(entry)
    }
}
