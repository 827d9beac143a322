//! Error taxonomy for the layer stack: `InvalidAddress` for a specific
//! inaccessible byte, `LayerError` for DAG and mapping structural
//! violations, and two plain variants raised by the scan pipeline's
//! argument validation.

use crate::address::Address;

/// A single byte (or range starting there) outside a layer's readable or
/// writable region. Raised by reads, writes, and translations; suppressed
/// into zero-fill by `pad = true` and into gap tolerance by
/// `ignore_errors = true` at the relevant call sites.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid address in layer '{layer}' at {offset}: {description}")]
pub struct InvalidAddress {
    pub layer: String,
    pub offset: Address,
    pub description: String,
}

impl InvalidAddress {
    pub fn new(layer: impl Into<String>, offset: Address, description: impl Into<String>) -> Self {
        InvalidAddress {
            layer: layer.into(),
            offset,
            description: description.into(),
        }
    }
}

/// Structural violations in the layer DAG or in a translation's mapping.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LayerError {
    #[error("layer already exists: {0}")]
    Exists(String),
    #[error("layer '{layer}' has unmet dependencies: {}", .missing.join(", "))]
    UnmetDependencies { layer: String, missing: Vec<String> },
    #[error("layer '{0}' is depended upon: {}", .1.join(", "))]
    DependedUpon(String, Vec<String>),
    #[error("mapping returned an overlapping element in layer '{0}'")]
    OverlappingMapping(String),
    #[error("no such layer: {0}")]
    NoSuchLayer(String),
    #[error("cycle detected in layer dependency graph: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
}

/// The top-level error type returned by fallible layer and memory
/// operations: `InvalidAddress` for byte-level faults, `LayerError` for
/// structural faults, `OutOfRange` for bad scan bounds, and `NotCallable`
/// for a non-callable progress callback.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LayerException {
    #[error(transparent)]
    InvalidAddress(#[from] InvalidAddress),
    #[error(transparent)]
    Layer(#[from] LayerError),
    #[error("{0}")]
    OutOfRange(String),
    #[error("{0}")]
    NotCallable(String),
}

pub type Result<T> = std::result::Result<T, LayerException>;
