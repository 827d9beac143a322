//! The abstract layer contract: a named, addressable byte space with
//! defined bounds, shared by leaf [`data`] layers and composing
//! [`translation`] layers.

pub mod data;
pub mod translation;

pub use data::BufferLayer;
pub use translation::{MappedTranslationLayer, MappingTuple};

use crate::address::{Address, ByteSize};
use crate::config::{HierarchicalDict, Requirement};
use crate::error::Result;
use crate::memory::Memory;
use crate::metadata::Metadata;
use crate::scan::ScanChunk;

/// Unit of addressable storage: either a leaf [`data`] layer or a
/// composing [`translation`] layer. Stored in [`Memory`] behind a
/// `Box<dyn Layer>` and referenced by name only — a translation layer
/// never holds a direct handle to its dependencies, only their names,
/// resolved through `Memory` at each access. This avoids cyclic ownership
/// and lets a dependency be hot-swapped by `Memory::del_layer` /
/// `add_layer`.
pub trait Layer: Send + Sync {
    /// Globally unique within one `Memory` instance.
    fn name(&self) -> &str;

    /// Inclusive lower bound of this layer's own address space.
    fn minimum_address(&self) -> Address;

    /// Inclusive upper bound of this layer's own address space.
    fn maximum_address(&self) -> Address;

    /// A bitmask covering all significant bits of `maximum_address`.
    fn address_mask(&self) -> usize {
        self.maximum_address().address_mask()
    }

    /// Names of layers this layer reads through. Empty for a leaf data
    /// layer; non-empty for a translation layer.
    fn dependencies(&self) -> &[String];

    /// This layer's own metadata, not including anything inherited from
    /// dependencies. Always includes `architecture` and `os` (defaulting
    /// to `"Unknown"`); see [`Metadata::new`].
    fn direct_metadata(&self) -> &Metadata;

    /// The effective metadata: `direct_metadata` overlaid on top of the
    /// metadata of each dependency, in dependency order, resolved through
    /// `memory`.
    fn metadata(&self, memory: &Memory) -> Metadata {
        let deps = self
            .dependencies()
            .iter()
            .filter_map(|name| memory.get(name))
            .map(|layer| layer.metadata(memory));
        self.direct_metadata().clone().merged_over(deps)
    }

    /// Whether `[offset, offset + length)` lies within the layer's
    /// accessible region.
    fn is_valid(&self, offset: Address, length: ByteSize) -> bool;

    /// Reads `length` bytes starting at `offset`. Fails with
    /// `InvalidAddress` when any byte is inaccessible, unless `pad` is
    /// set, in which case inaccessible bytes are replaced with `0x00` and
    /// no error is raised. `memory` lets a translation layer recurse into
    /// its dependencies.
    fn read(&self, memory: &Memory, offset: Address, length: ByteSize, pad: bool) -> Result<Vec<u8>>;

    /// Writes `data` at `offset`. Non-atomic: partial writes before a
    /// failure are observable. Fails with `InvalidAddress` on any
    /// inaccessible byte.
    fn write(&self, memory: &Memory, offset: Address, data: &[u8]) -> Result<()>;

    /// Releases underlying handles; subsequent reads/writes fail. Called
    /// exactly once, by `Memory::del_layer`, right before the layer is
    /// dropped.
    fn destroy(&self) {}

    /// Enumerates the chunks the scan pipeline should feed to a scanner
    /// over `[min_addr, max_addr)`, each sized at most `chunk_size +
    /// overlap`. A `DataLayer` walks the range linearly, assuming no
    /// holes; a `TranslationLayer` chunks each mapped span independently
    /// and never lets a chunk cross a gap.
    fn scan_iterator(
        &self,
        memory: &Memory,
        min_addr: Address,
        max_addr: Address,
        chunk_size: usize,
        overlap: usize,
    ) -> Vec<ScanChunk>;

    /// This layer type's configuration requirements, e.g. the name of the
    /// underlying layer a translation layer maps onto. Declared
    /// per-instance here (rather than as an associated function) so it
    /// can be exposed through a `&dyn Layer`; concrete implementations
    /// return a fixed instance-independent list.
    fn requirements(&self) -> Vec<Requirement> {
        Vec::new()
    }

    /// This layer's own configuration, always including the fully
    /// qualified type identifier under `"class"`.
    fn build_configuration(&self) -> HierarchicalDict;
}
