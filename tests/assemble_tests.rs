// tests/assemble_tests.rs
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use ndchunk::*;

/// Counts fetches per chunk so tests can assert a chunk was never read.
struct CountingRetriever<R> {
    inner: R,
    fetches: AtomicUsize,
}

impl<R> CountingRetriever<R> {
    fn new(inner: R) -> Self {
        CountingRetriever {
            inner,
            fetches: AtomicUsize::new(0),
        }
    }

    fn count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl<R: ChunkRetriever> ChunkRetriever for CountingRetriever<R> {
    fn fetch(&self, entry: &ChunkIndexEntry) -> Result<Bytes> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(entry)
    }
}

fn le_f32(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Logical shape [4, 8], chunk shape [2, 4], four uncompressed f32
/// chunks at grid coords (0,0), (0,1), (1,0), (1,1). Chunk (r, c) holds
/// the sequential values r*100 + c*8 .. r*100 + c*8 + 8 in row-major
/// chunk order.
fn four_chunk_fixture() -> (VariableDescriptor, ChunkIndex, Vec<u8>) {
    let descriptor = VariableDescriptor::unfiltered(
        &[4, 8],
        &[2, 4],
        ElementType::Float32,
        ByteOrder::Little,
    )
    .unwrap();

    let mut blob = Vec::new();
    let mut entries = Vec::new();
    for row in 0..2u64 {
        for col in 0..2u64 {
            let base = row as f32 * 100.0 + col as f32 * 8.0;
            entries.push(ChunkIndexEntry::local(&[row, col], blob.len() as u64, 32));
            blob.extend(le_f32(&(0..8).map(|i| base + i as f32).collect::<Vec<_>>()));
        }
    }
    let index = ChunkIndex::build(&descriptor, entries).unwrap();
    (descriptor, index, blob)
}

#[test]
fn test_slice_spanning_all_four_chunks() {
    let (descriptor, index, blob) = four_chunk_fixture();
    let assembler = ArrayAssembler::new(MemoryRetriever::new(blob));

    // Rows 1..=2, cols 2..=5, stride 1: a 2x4 window crossing every
    // chunk boundary.
    let slab = HyperslabRequest::new(vec![DimRange::span(1, 2), DimRange::span(2, 5)]);
    let out = assembler.assemble(&descriptor, &index, &slab).unwrap();

    let values: Vec<f32> = values_from_bytes(&out).unwrap();
    // Row 1: chunk (0,0) elements (1,2),(1,3) then chunk (0,1) (1,0),(1,1).
    // Row 2: chunk (1,0) elements (0,2),(0,3) then chunk (1,1) (0,0),(0,1).
    assert_eq!(
        values,
        &[6.0, 7.0, 12.0, 13.0, 102.0, 103.0, 108.0, 109.0]
    );
}

#[test]
fn test_row_stride_two_returns_even_rows() {
    let (descriptor, index, blob) = four_chunk_fixture();
    let assembler = ArrayAssembler::new(MemoryRetriever::new(blob));

    // Rows 0 and 2 only.
    let slab = HyperslabRequest::new(vec![DimRange::new(0, 2, 2), DimRange::span(0, 7)]);
    let out = assembler.assemble(&descriptor, &index, &slab).unwrap();

    let values: &[f32] = bytemuck::cast_slice(&out);
    assert_eq!(values.len(), 16);
    // Row 0 spans chunks (0,0) and (0,1).
    assert_eq!(
        &values[..8],
        &[0.0, 1.0, 2.0, 3.0, 8.0, 9.0, 10.0, 11.0]
    );
    // Row 2 spans chunks (1,0) and (1,1).
    assert_eq!(
        &values[8..],
        &[100.0, 101.0, 102.0, 103.0, 108.0, 109.0, 110.0, 111.0]
    );
}

#[test]
fn test_stride_skips_untouched_chunks_entirely() {
    // Shape [8], chunks of 2: samples at rows 0 and 6 leave chunks 1 and
    // 2 without any selected element; they must never be fetched.
    let descriptor =
        VariableDescriptor::unfiltered(&[8], &[2], ElementType::UInt8, ByteOrder::Little).unwrap();
    let blob: Vec<u8> = (0..8).collect();
    let entries: Vec<_> = (0..4u64)
        .map(|c| ChunkIndexEntry::local(&[c], c * 2, 2))
        .collect();
    let index = ChunkIndex::build(&descriptor, entries).unwrap();

    let retriever = CountingRetriever::new(MemoryRetriever::new(blob));
    let assembler = ArrayAssembler::new(&retriever);

    let slab = HyperslabRequest::new(vec![DimRange::new(0, 6, 6)]);
    let out = assembler.assemble(&descriptor, &index, &slab).unwrap();

    assert_eq!(out, vec![0, 6]);
    assert_eq!(retriever.count(), 2, "only chunks 0 and 3 hold samples");
}

#[test]
fn test_missing_chunk_fills_without_fetch() {
    let descriptor = VariableDescriptor::new(
        &[4, 8],
        &[2, 4],
        ElementType::Float32,
        ByteOrder::Little,
        FillValue::from_f32(-1.5, ByteOrder::Little),
        Vec::new(),
    )
    .unwrap();

    // Only chunk (0,0) exists.
    let blob = le_f32(&(0..8).map(|i| i as f32).collect::<Vec<_>>());
    let index =
        ChunkIndex::build(&descriptor, vec![ChunkIndexEntry::local(&[0, 0], 0, 32)]).unwrap();

    let retriever = CountingRetriever::new(MemoryRetriever::new(blob));
    let assembler = ArrayAssembler::new(&retriever);

    let out = assembler
        .assemble(&descriptor, &index, &HyperslabRequest::whole(&[4, 8]))
        .unwrap();
    let values: &[f32] = bytemuck::cast_slice(&out);

    assert_eq!(values[0], 0.0);
    assert_eq!(values[11], 7.0); // row 1, col 3: still chunk (0,0)
    assert_eq!(values[12], -1.5); // row 1, col 4: chunk (0,1), missing
    assert_eq!(values[31], -1.5);
    assert_eq!(retriever.count(), 1, "missing chunks cost no fetch");
}

#[test]
fn test_edge_chunks_contribute_only_in_bounds_region() {
    // Logical shape [3, 5] under [2, 4] chunks: every chunk except (0,0)
    // is an edge chunk, stored full-size with sentinel padding.
    let descriptor =
        VariableDescriptor::unfiltered(&[3, 5], &[2, 4], ElementType::UInt8, ByteOrder::Little)
            .unwrap();

    let mut blob = Vec::new();
    let mut entries = Vec::new();
    for row in 0..2u64 {
        for col in 0..2u64 {
            entries.push(ChunkIndexEntry::local(&[row, col], blob.len() as u64, 8));
            let mut chunk = [0xEEu8; 8]; // sentinel: out-of-bounds padding
            for r in 0..2u64 {
                for c in 0..4u64 {
                    let gr = row * 2 + r;
                    let gc = col * 4 + c;
                    if gr < 3 && gc < 5 {
                        chunk[(r * 4 + c) as usize] = (gr * 10 + gc) as u8;
                    }
                }
            }
            blob.extend(chunk);
        }
    }
    let index = ChunkIndex::build(&descriptor, entries).unwrap();
    let assembler = ArrayAssembler::new(MemoryRetriever::new(blob));

    let out = assembler
        .assemble(&descriptor, &index, &HyperslabRequest::whole(&[3, 5]))
        .unwrap();

    assert_eq!(out.len(), 15);
    assert!(
        out.iter().all(|&b| b != 0xEE),
        "padding bytes must never reach the output"
    );
    let expected: Vec<u8> = (0..3u8)
        .flat_map(|r| (0..5u8).map(move |c| r * 10 + c))
        .collect();
    assert_eq!(out, expected);
}

#[test]
fn test_assembly_is_idempotent() {
    let (descriptor, index, blob) = four_chunk_fixture();
    let assembler = ArrayAssembler::new(MemoryRetriever::new(blob));
    let slab = HyperslabRequest::new(vec![DimRange::new(0, 3, 3), DimRange::new(1, 2, 7)]);

    let first = assembler.assemble(&descriptor, &index, &slab).unwrap();
    let second = assembler.assemble(&descriptor, &index, &slab).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_output_length_matches_counts_product() {
    let (descriptor, index, blob) = four_chunk_fixture();
    let assembler = ArrayAssembler::new(MemoryRetriever::new(blob));

    for slab in [
        HyperslabRequest::whole(&[4, 8]),
        HyperslabRequest::new(vec![DimRange::new(1, 2, 3), DimRange::new(0, 3, 7)]),
        HyperslabRequest::new(vec![DimRange::span(3, 3), DimRange::span(7, 7)]),
    ] {
        let out = assembler.assemble(&descriptor, &index, &slab).unwrap();
        assert_eq!(
            out.len() as u64,
            slab.output_elements() * 4,
            "slab {:?}",
            slab
        );
    }
}

#[test]
fn test_remote_entries_via_range_transport() {
    // Same four-chunk variable, but each chunk row lives in a different
    // remote object.
    let descriptor = VariableDescriptor::unfiltered(
        &[4, 8],
        &[2, 4],
        ElementType::Float32,
        ByteOrder::Little,
    )
    .unwrap();

    let mut row0 = Vec::new();
    let mut row1 = Vec::new();
    let mut entries = Vec::new();
    for col in 0..2u64 {
        entries.push(ChunkIndexEntry::remote(&[0, col], "obj/row0", row0.len() as u64, 32));
        row0.extend(le_f32(&(0..8).map(|i| (col * 8 + i) as f32).collect::<Vec<_>>()));
        entries.push(ChunkIndexEntry::remote(&[1, col], "obj/row1", row1.len() as u64, 32));
        row1.extend(le_f32(
            &(0..8).map(|i| 100.0 + (col * 8 + i) as f32).collect::<Vec<_>>(),
        ));
    }
    let index = ChunkIndex::build(&descriptor, entries).unwrap();

    let store = MemoryRetriever::default()
        .with_resource("obj/row0", row0)
        .with_resource("obj/row1", row1);
    let assembler = ArrayAssembler::new(store);

    let slab = HyperslabRequest::new(vec![DimRange::span(1, 2), DimRange::span(2, 5)]);
    let out = assembler.assemble(&descriptor, &index, &slab).unwrap();
    let values: &[f32] = bytemuck::cast_slice(&out);
    assert_eq!(values, &[6.0, 7.0, 12.0, 13.0, 102.0, 103.0, 108.0, 109.0]);
}
