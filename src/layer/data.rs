//! Leaf layers: own a byte source directly and have no layer dependencies.
//! `BufferLayer` is the concrete in-memory leaf shipped with the core.
//! Real byte sources (raw dump files, block devices) are concrete
//! `DataLayer` implementations expected to live outside this crate.

use std::sync::RwLock;

use crate::address::{Address, ByteSize};
use crate::config::HierarchicalDict;
use crate::error::{InvalidAddress, LayerException, Result};
use crate::layer::Layer;
use crate::memory::Memory;
use crate::metadata::Metadata;
use crate::scan::{iterator::gapless_scan_iterator, ScanChunk};

/// A leaf layer backed by an in-memory byte buffer. Assumed gapless across
/// `[minimum_address, maximum_address]`.
pub struct BufferLayer {
    name: String,
    data: RwLock<Option<Vec<u8>>>,
    metadata: Metadata,
}

impl BufferLayer {
    pub fn new(name: impl Into<String>, data: Vec<u8>, metadata: Metadata) -> Self {
        BufferLayer {
            name: name.into(),
            data: RwLock::new(Some(data)),
            metadata,
        }
    }

    fn len(&self) -> usize {
        self.data.read().unwrap().as_ref().map_or(0, Vec::len)
    }

    fn destroyed(&self) -> bool {
        self.data.read().unwrap().is_none()
    }
}

impl Layer for BufferLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn minimum_address(&self) -> Address {
        Address::ZERO
    }

    fn maximum_address(&self) -> Address {
        let len = self.len();
        Address::from_usize(len.saturating_sub(1))
    }

    fn dependencies(&self) -> &[String] {
        &[]
    }

    fn direct_metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn is_valid(&self, offset: Address, length: ByteSize) -> bool {
        if self.destroyed() || length == 0 {
            return !self.destroyed();
        }
        let end = offset.as_usize().saturating_add(length);
        offset.as_usize() < self.len() && end <= self.len()
    }

    fn read(&self, _memory: &Memory, offset: Address, length: ByteSize, pad: bool) -> Result<Vec<u8>> {
        let guard = self.data.read().unwrap();
        let data = guard.as_ref().ok_or_else(|| {
            LayerException::InvalidAddress(InvalidAddress::new(
                self.name.clone(),
                offset,
                "layer has been destroyed",
            ))
        })?;

        let start = offset.as_usize();
        let end = start + length;
        if end <= data.len() {
            return Ok(data[start..end].to_vec());
        }
        if !pad {
            let bad_offset = if start >= data.len() {
                offset
            } else {
                Address::from_usize(data.len())
            };
            return Err(LayerException::InvalidAddress(InvalidAddress::new(
                self.name.clone(),
                bad_offset,
                format!("offset {offset} out of range for layer '{}'", self.name),
            )));
        }
        let mut out = Vec::with_capacity(length);
        if start < data.len() {
            out.extend_from_slice(&data[start..]);
        }
        out.resize(length, 0u8);
        Ok(out)
    }

    fn write(&self, _memory: &Memory, offset: Address, bytes: &[u8]) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        let data = guard.as_mut().ok_or_else(|| {
            LayerException::InvalidAddress(InvalidAddress::new(
                self.name.clone(),
                offset,
                "layer has been destroyed",
            ))
        })?;
        let start = offset.as_usize();
        let end = start + bytes.len();
        if end > data.len() {
            return Err(LayerException::InvalidAddress(InvalidAddress::new(
                self.name.clone(),
                Address::from_usize(data.len().min(start)),
                format!("write to {offset} exceeds layer '{}' bounds", self.name),
            )));
        }
        data[start..end].copy_from_slice(bytes);
        Ok(())
    }

    fn destroy(&self) {
        *self.data.write().unwrap() = None;
    }

    fn scan_iterator(
        &self,
        _memory: &Memory,
        min_addr: Address,
        max_addr: Address,
        chunk_size: usize,
        overlap: usize,
    ) -> Vec<ScanChunk> {
        gapless_scan_iterator(&self.name, min_addr, max_addr, chunk_size, overlap)
    }

    fn build_configuration(&self) -> HierarchicalDict {
        HierarchicalDict::for_class("layerfs::layer::data::BufferLayer")
    }
}
