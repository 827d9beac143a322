//! Translation layers: map address ranges in their own space onto one or
//! more spans in named lower layers. `read`/`write`/`translate`/
//! `scan_iterator` are all derived mechanically from `mapping`, following
//! following a mechanical derivation from a single mapping lookup.

use crate::address::{Address, ByteSize};
use crate::config::HierarchicalDict;
use crate::error::{InvalidAddress, LayerException, Result};
use crate::layer::Layer;
use crate::memory::Memory;
use crate::metadata::Metadata;
use crate::scan::iterator::span_scan_iterator;
use crate::scan::ScanChunk;

/// `(offset, mapped_offset, length, layer_name)`: one contiguous
/// translation from the translating layer's space onto a span of
/// `layer_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTuple {
    /// address in the translating layer's space
    pub offset: Address,
    /// address in the underlying layer
    pub mapped_offset: Address,
    /// number of bytes mapped contiguously
    pub length: ByteSize,
    pub layer_name: String,
}

/// Additional contract a [`Layer`] implements when it translates or
/// transforms one or more other layers.
pub trait TranslationLayer: Layer {
    /// Returns a sorted, non-overlapping sequence of mapping tuples
    /// covering `[offset, offset + length)` of this layer's space.
    ///
    /// When `ignore_errors` is `false`, the tuple lengths sum to exactly
    /// `length`. When `true`, gaps are permitted and the returned tuples
    /// may leave regions uncovered.
    fn mapping(&self, offset: Address, length: ByteSize, ignore_errors: bool) -> Result<Vec<MappingTuple>>;

    /// Returns the first mapping tuple's `(mapped_offset, layer_name)` for
    /// a zero-length probe at `offset`, or `(None, None)` when
    /// `ignore_errors` and no mapping exists, or `InvalidAddress`
    /// otherwise.
    fn translate(&self, offset: Address, ignore_errors: bool) -> Result<(Option<Address>, Option<String>)> {
        let mapping = self.mapping(offset, 0, ignore_errors)?;
        match mapping.first() {
            Some(tuple) => Ok((Some(tuple.mapped_offset), Some(tuple.layer_name.clone()))),
            None if ignore_errors => Ok((None, None)),
            None => Err(LayerException::InvalidAddress(InvalidAddress::new(
                self.name().to_string(),
                offset,
                format!("cannot translate {offset} in layer '{}'", self.name()),
            ))),
        }
    }
}

/// Derives `Layer::read` for a translation layer from its `mapping`.
pub fn derive_read(
    layer: &dyn TranslationLayer,
    memory: &Memory,
    offset: Address,
    length: ByteSize,
    pad: bool,
) -> Result<Vec<u8>> {
    let mut current = offset;
    let mut out = Vec::with_capacity(length);
    // Always walk with ignore_errors=true so a gap surfaces as
    // InvalidAddress(current) from the walk below, at the gap's start, not
    // from mapping()'s own coverage check at the call offset.
    for tuple in layer.mapping(offset, length, true)? {
        if tuple.offset > current {
            if !pad {
                return Err(LayerException::InvalidAddress(InvalidAddress::new(
                    layer.name().to_string(),
                    current,
                    format!("layer '{}' cannot map offset {current}", layer.name()),
                )));
            }
            out.resize(out.len() + (tuple.offset - current), 0u8);
            current = tuple.offset;
        } else if tuple.offset < current {
            return Err(LayerException::Layer(crate::error::LayerError::OverlappingMapping(
                layer.name().to_string(),
            )));
        }
        let chunk = memory.read(&tuple.layer_name, tuple.mapped_offset, tuple.length, pad)?;
        out.extend_from_slice(&chunk);
        current += tuple.length;
    }
    if out.len() < length {
        out.resize(length, 0u8);
    }
    Ok(out)
}

/// Derives `Layer::write` for a translation layer from its `mapping`.
pub fn derive_write(
    layer: &dyn TranslationLayer,
    memory: &Memory,
    offset: Address,
    data: &[u8],
) -> Result<()> {
    let mut current = offset;
    let mut written = 0usize;
    // Same reasoning as derive_read: walk with ignore_errors=true so a gap
    // raises InvalidAddress(current) from the walk, at the gap's start.
    for tuple in layer.mapping(offset, data.len(), true)? {
        if tuple.offset > current {
            return Err(LayerException::InvalidAddress(InvalidAddress::new(
                layer.name().to_string(),
                current,
                format!("layer '{}' cannot map offset {current}", layer.name()),
            )));
        } else if tuple.offset < current {
            return Err(LayerException::Layer(crate::error::LayerError::OverlappingMapping(
                layer.name().to_string(),
            )));
        }
        let slice = &data[written..written + tuple.length];
        memory.write(&tuple.layer_name, tuple.mapped_offset, slice)?;
        current += tuple.length;
        written += tuple.length;
    }
    Ok(())
}

/// Derives `Layer::scan_iterator` for a translation layer: chunks
/// `mapping(min, max-min, ignore_errors=true)` span by span, so that no
/// chunk crosses a gap between mapped spans.
pub fn derive_scan_iterator(
    layer: &dyn TranslationLayer,
    min_addr: Address,
    max_addr: Address,
    chunk_size: usize,
    overlap: usize,
) -> Vec<ScanChunk> {
    let mapping = match layer.mapping(min_addr, max_addr - min_addr, true) {
        Ok(m) => m,
        Err(_) => return Vec::new(),
    };
    mapping
        .into_iter()
        .flat_map(|tuple| {
            span_scan_iterator(
                tuple.offset,
                tuple.mapped_offset,
                tuple.length,
                &tuple.layer_name,
                chunk_size,
                overlap,
            )
        })
        .collect()
}

/// A concrete translation layer holding an explicit, fixed table of
/// mapping ranges onto one underlying layer — enough to compose layers in
/// tests and simple deployments without modelling a page-table walker.
/// Real translation layers (e.g. paged virtual address spaces) are
/// expected to implement [`TranslationLayer`] directly with their own
/// `mapping` logic.
pub struct MappedTranslationLayer {
    name: String,
    /// `(offset, mapped_offset, length)` ranges, sorted ascending by
    /// `offset`, non-overlapping, all onto `target`.
    ranges: Vec<(Address, Address, ByteSize)>,
    target: String,
    maximum_address: Address,
    metadata: Metadata,
}

impl MappedTranslationLayer {
    /// `ranges` must already be sorted ascending by offset and
    /// non-overlapping; this is a structural precondition of the layer,
    /// not re-validated on every `mapping` call.
    pub fn new(
        name: impl Into<String>,
        target: impl Into<String>,
        ranges: Vec<(Address, Address, ByteSize)>,
        maximum_address: Address,
        metadata: Metadata,
    ) -> Self {
        MappedTranslationLayer {
            name: name.into(),
            ranges,
            target: target.into(),
            maximum_address,
            metadata,
        }
    }
}

impl TranslationLayer for MappedTranslationLayer {
    fn mapping(&self, offset: Address, length: ByteSize, ignore_errors: bool) -> Result<Vec<MappingTuple>> {
        let end = offset + length;
        let mut tuples = Vec::new();
        for &(range_offset, range_mapped, range_len) in &self.ranges {
            let range_end = range_offset + range_len;
            if range_end <= offset || range_offset >= end {
                continue;
            }
            let clip_start = range_offset.max(offset);
            let clip_end = range_end.min(end);
            let skip = clip_start - range_offset;
            tuples.push(MappingTuple {
                offset: clip_start,
                mapped_offset: range_mapped + skip,
                length: clip_end - clip_start,
                layer_name: self.target.clone(),
            });
        }
        if !ignore_errors {
            let covered: usize = tuples.iter().map(|t| t.length).sum();
            if covered != length {
                return Err(LayerException::InvalidAddress(InvalidAddress::new(
                    self.name.clone(),
                    offset,
                    format!("layer '{}' has gaps in [{offset}, {end})", self.name),
                )));
            }
        }
        Ok(tuples)
    }
}

impl Layer for MappedTranslationLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn minimum_address(&self) -> Address {
        Address::ZERO
    }

    fn maximum_address(&self) -> Address {
        self.maximum_address
    }

    fn dependencies(&self) -> &[String] {
        std::slice::from_ref(&self.target)
    }

    fn direct_metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn is_valid(&self, offset: Address, length: ByteSize) -> bool {
        self.mapping(offset, length, false).is_ok()
    }

    fn read(&self, memory: &Memory, offset: Address, length: ByteSize, pad: bool) -> Result<Vec<u8>> {
        derive_read(self, memory, offset, length, pad)
    }

    fn write(&self, memory: &Memory, offset: Address, data: &[u8]) -> Result<()> {
        derive_write(self, memory, offset, data)
    }

    fn scan_iterator(
        &self,
        _memory: &Memory,
        min_addr: Address,
        max_addr: Address,
        chunk_size: usize,
        overlap: usize,
    ) -> Vec<ScanChunk> {
        derive_scan_iterator(self, min_addr, max_addr, chunk_size, overlap)
    }

    fn build_configuration(&self) -> HierarchicalDict {
        HierarchicalDict::for_class("layerfs::layer::translation::MappedTranslationLayer")
    }
}
