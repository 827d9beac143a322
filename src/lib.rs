//! `layerfs` is a layered, byte-addressable memory model for memory-
//! forensics frameworks. Arbitrary address spaces — raw dump files, paged
//! virtual spaces, transformed/encrypted regions — are exposed through a
//! uniform read/write/scan interface and composed into a directed acyclic
//! graph, so a consumer can scan a virtual address space without knowing
//! which physical file regions, gaps, or translations underlie it.
//!
//! Logically, this crate includes:
//! * [`address`]: the `Address` type used throughout for byte offsets.
//! * [`layer`]: the abstract [`layer::Layer`] contract, its leaf
//!   ([`layer::data`]) and composing ([`layer::translation`]) variants.
//! * [`memory`]: the [`memory::Memory`] DAG that owns named layers and
//!   enforces dependency integrity.
//! * [`scanner`] and [`scan`]: the scanner contract and the pipeline that
//!   chunks, optionally parallelises, and streams scanner matches across
//!   a layer's mapped address range.
//! * [`metadata`] and [`config`]: the metadata-chain and configuration
//!   boundary contracts layers expose to external collaborators.
//! * [`error`]: the error taxonomy shared across the crate.
//!
//! Concrete decoders, registry/symbol/plugin subsystems, configuration
//! loading, CLI, and rendering are explicitly out of scope; they are
//! external collaborators that only consume the contracts above.

pub mod address;
pub mod config;
pub mod error;
pub mod layer;
pub mod logger;
pub mod memory;
pub mod metadata;
pub mod scan;
pub mod scanner;

pub use address::Address;
pub use error::{LayerException, Result};
pub use layer::Layer;
pub use memory::Memory;
pub use scanner::Scanner;
