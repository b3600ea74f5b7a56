// src/assemble/async_assemble.rs
use std::sync::Arc;

use bytes::Bytes;
use log::debug;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::descriptor::VariableDescriptor;
use crate::error::{NdChunkError, Result};
use crate::filter::{FilterContext, FilterPipeline};
use crate::hyperslab::HyperslabRequest;
use crate::index::ChunkIndex;
use crate::retrieve::AsyncChunkRetriever;

use super::plan::{apply_copy_runs, apply_fill_runs, chunk_plan, copy_runs, fill_runs, CopyRun};

/// Async assembler: chunk fetches run concurrently under a semaphore
/// that bounds in-flight requests, capping both the memory held by
/// simultaneously-decoding chunk buffers and the pressure on the remote
/// store.
///
/// Dropping the future returned by [`assemble`](Self::assemble) cancels
/// in-flight fetches; a partially-filled output buffer is discarded,
/// never returned.
pub struct AsyncArrayAssembler<R> {
    retriever: Arc<R>,
    pipeline: Arc<FilterPipeline>,
    max_in_flight: usize,
}

impl<R: AsyncChunkRetriever + 'static> AsyncArrayAssembler<R> {
    pub fn new(retriever: R, max_in_flight: usize) -> Self {
        AsyncArrayAssembler {
            retriever: Arc::new(retriever),
            pipeline: Arc::new(FilterPipeline::new()),
            max_in_flight: max_in_flight.max(1),
        }
    }

    pub fn with_pipeline(retriever: R, pipeline: FilterPipeline, max_in_flight: usize) -> Self {
        AsyncArrayAssembler {
            retriever: Arc::new(retriever),
            pipeline: Arc::new(pipeline),
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Fill the hyperslab, fetching and decoding overlapping chunks
    /// concurrently. Same result, byte for byte, as the sequential
    /// driver; the first chunk failure aborts the request and the
    /// remaining tasks are dropped.
    pub async fn assemble(
        &self,
        descriptor: &VariableDescriptor,
        index: &ChunkIndex,
        slab: &HyperslabRequest,
    ) -> Result<Vec<u8>> {
        slab.validate(descriptor.shape())?;

        let element_size = descriptor.element_size();
        let counts = slab.counts();
        let mut out = vec![0u8; slab.output_elements() as usize * element_size];

        let ctx = FilterContext {
            decoded_size: descriptor.chunk_byte_size() as usize,
            element_size,
        };
        let filters: Arc<[String]> = descriptor.filters().into();

        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks: JoinSet<Result<(Bytes, Vec<CopyRun>)>> = JoinSet::new();

        let mut chunks = index.overlapping_chunk_coords(slab);
        while !chunks.is_exhausted() {
            let coord = chunks.indices();
            if let Some(plan) = chunk_plan(slab, descriptor.chunk_shape(), coord) {
                match index.lookup(coord) {
                    None => {
                        let runs = fill_runs(&plan, &counts, element_size);
                        apply_fill_runs(&mut out, descriptor.fill_value().as_bytes(), &runs);
                    }
                    Some(entry) => {
                        let runs =
                            copy_runs(&plan, slab, descriptor.chunk_shape(), &counts, element_size);
                        let entry = entry.clone();
                        let retriever = Arc::clone(&self.retriever);
                        let pipeline = Arc::clone(&self.pipeline);
                        let filters = Arc::clone(&filters);
                        let semaphore = Arc::clone(&semaphore);
                        tasks.spawn(async move {
                            let _permit = semaphore
                                .acquire()
                                .await
                                .map_err(|e| NdChunkError::WorkerPanic(e.to_string()))?;
                            let encoded = retriever.fetch(&entry).await?;
                            debug!(
                                "decoding chunk {:?}: {} -> {} bytes",
                                entry.coord,
                                encoded.len(),
                                ctx.decoded_size
                            );
                            let decoded = pipeline.decode(encoded, &filters, &ctx)?;
                            Ok((decoded, runs))
                        });
                    }
                }
            }
            chunks.next();
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| NdChunkError::WorkerPanic(e.to_string()))?;
            let (decoded, runs) = outcome?;
            apply_copy_runs(&mut out, &decoded, &runs);
        }

        Ok(out)
    }
}
