// src/assemble/parallel.rs
use crossbeam_channel::{bounded, unbounded};
use log::debug;

use crate::descriptor::VariableDescriptor;
use crate::error::{NdChunkError, Result};
use crate::hyperslab::HyperslabRequest;
use crate::index::{ChunkIndex, ChunkIndexEntry};
use crate::retrieve::ChunkRetriever;

use super::plan::{apply_copy_runs, apply_fill_runs, chunk_plan, copy_runs, fill_runs, CopyRun};
use super::ArrayAssembler;

type FetchJob = (ChunkIndexEntry, Vec<CopyRun>);

impl<R: ChunkRetriever> ArrayAssembler<R> {
    /// Like [`assemble`](Self::assemble), with chunk fetch+decode spread
    /// over a pool of `workers` threads.
    ///
    /// Chunks intersect a hyperslab in pairwise-disjoint output regions,
    /// so workers only fetch and decode; the calling thread applies each
    /// chunk's copy runs as results arrive. The job queue is bounded to
    /// cap the number of decoded chunk buffers in flight. The first
    /// failure aborts the request; remaining workers drain and exit when
    /// their channels disconnect.
    pub fn assemble_parallel(
        &self,
        descriptor: &VariableDescriptor,
        index: &ChunkIndex,
        slab: &HyperslabRequest,
        workers: usize,
    ) -> Result<Vec<u8>> {
        slab.validate(descriptor.shape())?;

        let element_size = descriptor.element_size();
        let counts = slab.counts();
        let mut out = vec![0u8; slab.output_elements() as usize * element_size];

        // Plan every chunk up front; fills need no worker.
        let mut jobs: Vec<FetchJob> = Vec::new();
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
                        jobs.push((entry.clone(), runs));
                    }
                }
            }
            chunks.next();
        }

        if jobs.is_empty() {
            return Ok(out);
        }

        let workers = workers.max(1).min(jobs.len());
        debug!("assembling {} chunks on {} workers", jobs.len(), workers);

        let (job_tx, job_rx) = bounded::<FetchJob>(workers * 2);
        let (result_tx, result_rx) = unbounded::<Result<(bytes::Bytes, Vec<CopyRun>)>>();
        let expected = jobs.len();

        let outcome = std::thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    while let Ok((entry, runs)) = job_rx.recv() {
                        let decoded = self.decode_chunk(descriptor, &entry).map(|b| (b, runs));
                        if result_tx.send(decoded).is_err() {
                            // Request abandoned; stop fetching.
                            break;
                        }
                    }
                });
            }
            drop(job_rx);
            drop(result_tx);

            scope.spawn(move || {
                for job in jobs {
                    if job_tx.send(job).is_err() {
                        break;
                    }
                }
            });

            let mut applied = 0usize;
            let mut first_err: Option<NdChunkError> = None;
            while applied < expected {
                match result_rx.recv() {
                    Ok(Ok((decoded, runs))) => {
                        apply_copy_runs(&mut out, &decoded, &runs);
                        applied += 1;
                    }
                    Ok(Err(e)) => {
                        first_err = Some(e);
                        break;
                    }
                    // All workers gone without enough results: at least
                    // one panicked.
                    Err(_) => {
                        first_err = Some(NdChunkError::WorkerPanic(
                            "worker exited before completing its chunks".to_string(),
                        ));
                        break;
                    }
                }
            }
            // Dropping the receiver unblocks workers and the feeder so
            // the scope can join them.
            drop(result_rx);
            first_err
        });

        match outcome {
            None => Ok(out),
            Some(e) => Err(e),
        }
    }
}
