//! Chunk descriptors produced by a layer's `scan_iterator` and consumed by
//! the scan pipeline in [`super::pipeline`].

use crate::address::{Address, ByteSize};

/// One span of a chunk: read `length` bytes from `layer_name` at
/// `mapped_offset`. A single [`ScanChunk`] may be built from more than one
/// span when multiple mapping tuples are folded into one scanner
/// invocation (not currently done by the default iterators, but the shape
/// supports it, matching the source's `(layer, offset, length)` list).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSpan {
    pub layer_name: String,
    pub mapped_offset: Address,
    pub length: ByteSize,
}

/// A chunk to be scanned: the spans making it up, and `chunk_end`, the
/// scan-space address just past this chunk (used both to resume from the
/// tail-overlap and to report scan progress).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanChunk {
    pub spans: Vec<ScanSpan>,
    pub chunk_end: Address,
}

/// Walks `[min_addr, max_addr)` linearly, assuming no holes — the default
/// iterator for a [`crate::layer::DataLayer`]. Chunks are sized to
/// `chunk_size + overlap` and subsequent chunks advance by `chunk_size`, so
/// that the overlap bytes of one chunk reappear at the head of the next.
pub fn gapless_scan_iterator(
    layer_name: &str,
    min_addr: Address,
    max_addr: Address,
    chunk_size: usize,
    overlap: usize,
) -> Vec<ScanChunk> {
    let mut chunks = Vec::new();
    let mut offset = min_addr;
    let mut mapped_offset = min_addr;
    let mut remaining = max_addr - min_addr;
    let budget = chunk_size + overlap;
    while remaining > 0 {
        let this_chunk = remaining.min(budget);
        chunks.push(ScanChunk {
            spans: vec![ScanSpan {
                layer_name: layer_name.to_string(),
                mapped_offset,
                length: this_chunk,
            }],
            chunk_end: offset + this_chunk,
        });
        // If we got more than chunk_size, only advance by chunk_size so the
        // overlap tail is replayed as the next chunk's head.
        let advance = if this_chunk > chunk_size {
            this_chunk - overlap
        } else {
            this_chunk
        };
        remaining -= advance;
        mapped_offset += advance;
        offset += advance;
    }
    chunks
}

/// Chunks a single contiguous mapped span `[offset, offset + length)` in
/// the translating layer's space, onto `(mapped_offset in layer_name)`.
/// Used once per mapping tuple by [`crate::layer::translation`]'s
/// `scan_iterator`, so that no chunk ever crosses a gap between spans.
pub fn span_scan_iterator(
    offset: Address,
    mapped_offset: Address,
    mut length: usize,
    layer_name: &str,
    chunk_size: usize,
    overlap: usize,
) -> Vec<ScanChunk> {
    let mut chunks = Vec::new();
    let mut offset = offset;
    let mut mapped_offset = mapped_offset;
    let budget = chunk_size + overlap;
    while length > 0 {
        let this_chunk = length.min(budget);
        chunks.push(ScanChunk {
            spans: vec![ScanSpan {
                layer_name: layer_name.to_string(),
                mapped_offset,
                length: this_chunk,
            }],
            chunk_end: offset + this_chunk,
        });
        let advance = if this_chunk > chunk_size {
            this_chunk - overlap
        } else {
            this_chunk
        };
        length -= advance;
        mapped_offset += advance;
        offset += advance;
    }
    chunks
}
