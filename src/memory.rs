//! [`Memory`]: the DAG owner. A name -> `Layer` mapping plus add/remove/
//! lookup operations that preserve acyclicity and dependency satisfaction.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::address::{Address, ByteSize};
use crate::error::{LayerError, LayerException, Result};
use crate::layer::Layer;

/// The layer DAG container and resolver. Read-only during a scan; callers
/// must synchronise externally around any `add_layer`/`del_layer` that
/// races with an in-flight scan.
#[derive(Default)]
pub struct Memory {
    layers: HashMap<String, Box<dyn Layer>>,
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            layers: HashMap::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Layer> {
        self.layers.get(name).map(|b| b.as_ref())
    }

    /// Adds `layer` to the DAG.
    ///
    /// Rejects a duplicate name with `LayerError::Exists`. If `layer`
    /// declares dependencies, every one of them must already be present,
    /// or this fails with `LayerError::UnmetDependencies` and `Memory` is
    /// left unchanged.
    pub fn add_layer(&mut self, layer: Box<dyn Layer>) -> Result<()> {
        let name = layer.name().to_string();
        if self.layers.contains_key(&name) {
            return Err(LayerException::Layer(LayerError::Exists(name)));
        }
        let missing: Vec<String> = layer
            .dependencies()
            .iter()
            .filter(|dep| !self.layers.contains_key(*dep))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(LayerException::Layer(LayerError::UnmetDependencies {
                layer: name,
                missing,
            }));
        }
        self.layers.insert(name, layer);
        Ok(())
    }

    /// Removes the layer called `name`.
    ///
    /// Fails with `LayerError::DependedUpon` if any *other* layer lists
    /// `name` among its dependencies; in that case no release is
    /// performed and `Memory` is unchanged. Otherwise invokes the layer's
    /// `destroy` hook, then removes it.
    pub fn del_layer(&mut self, name: &str) -> Result<()> {
        if !self.layers.contains_key(name) {
            return Err(LayerException::Layer(LayerError::NoSuchLayer(name.to_string())));
        }
        let dependents: Vec<String> = self
            .layers
            .iter()
            .filter(|(other_name, layer)| {
                other_name.as_str() != name && layer.dependencies().iter().any(|d| d == name)
            })
            .map(|(n, _)| n.clone())
            .collect();
        if !dependents.is_empty() {
            return Err(LayerException::Layer(LayerError::DependedUpon(
                name.to_string(),
                dependents,
            )));
        }
        if let Some(layer) = self.layers.get(name) {
            layer.destroy();
        }
        self.layers.remove(name);
        Ok(())
    }

    /// Reads `length` bytes from `offset` in the named layer.
    pub fn read(&self, layer: &str, offset: Address, length: ByteSize, pad: bool) -> Result<Vec<u8>> {
        self.layer_or_err(layer)?.read(self, offset, length, pad)
    }

    /// Writes `data` at `offset` in the named layer.
    pub fn write(&self, layer: &str, offset: Address, data: &[u8]) -> Result<()> {
        self.layer_or_err(layer)?.write(self, offset, data)
    }

    fn layer_or_err(&self, name: &str) -> Result<&dyn Layer> {
        self.get(name)
            .ok_or_else(|| LayerException::Layer(LayerError::NoSuchLayer(name.to_string())))
    }

    /// Returns `prefix + k` for the smallest positive integer `k` that is
    /// not yet a layer name.
    pub fn free_layer_name(&self, prefix: &str) -> String {
        let mut count = 1usize;
        loop {
            let candidate = format!("{prefix}{count}");
            if !self.layers.contains_key(&candidate) {
                return candidate;
            }
            count += 1;
        }
    }

    /// Validates that the dependency graph induced by the current layers
    /// is acyclic. `add_layer` already refuses forward references onto
    /// not-yet-present layers, so cycles cannot arise from well-formed
    /// additions; this exists to validate externally constructed `Memory`
    /// instances (e.g. deserialised from config) before first use.
    pub fn check_cycles(&self) -> Result<()> {
        let mut visiting: HashSet<&str> = HashSet::new();
        let mut done: HashSet<&str> = HashSet::new();

        fn visit<'a>(
            memory: &'a Memory,
            name: &'a str,
            visiting: &mut HashSet<&'a str>,
            done: &mut HashSet<&'a str>,
            path: &mut Vec<String>,
        ) -> Result<()> {
            if done.contains(name) {
                return Ok(());
            }
            if visiting.contains(name) {
                path.push(name.to_string());
                return Err(LayerException::Layer(LayerError::Cycle(path.clone())));
            }
            visiting.insert(name);
            path.push(name.to_string());
            if let Some(layer) = memory.layers.get(name) {
                for dep in layer.dependencies() {
                    visit(memory, dep.as_str(), visiting, done, path)?;
                }
            }
            path.pop();
            visiting.remove(name);
            done.insert(name);
            Ok(())
        }

        for name in self.layers.keys() {
            let mut path = Vec::new();
            visit(self, name.as_str(), &mut visiting, &mut done, &mut path)?;
        }
        Ok(())
    }
}

pub(crate) fn log_skipped_span(layer: &str, scanned_layer: &str, offset: Address) {
    debug!("invalid address in layer {layer} found scanning {scanned_layer} at {offset}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::data::BufferLayer;
    use crate::layer::translation::MappedTranslationLayer;
    use crate::metadata::Metadata;

    fn buffer(name: &str) -> Box<dyn Layer> {
        Box::new(BufferLayer::new(name, vec![0u8; 0x1000], Metadata::new()))
    }

    #[test]
    fn duplicate_add_rejected() {
        let mut memory = Memory::new();
        memory.add_layer(buffer("a")).unwrap();
        let err = memory.add_layer(buffer("a")).unwrap_err();
        assert!(matches!(err, LayerException::Layer(LayerError::Exists(_))));
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn unmet_dependency_rejected() {
        let mut memory = Memory::new();
        let t = MappedTranslationLayer::new(
            "T",
            "base",
            vec![],
            Address::from_usize(0xFFF),
            Metadata::new(),
        );
        let err = memory.add_layer(Box::new(t)).unwrap_err();
        match err {
            LayerException::Layer(LayerError::UnmetDependencies { missing, .. }) => {
                assert_eq!(missing, vec!["base".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(memory.is_empty());
    }

    #[test]
    fn del_depended_upon_layer_rejected() {
        let mut memory = Memory::new();
        memory.add_layer(buffer("D")).unwrap();
        let t = MappedTranslationLayer::new(
            "T",
            "D",
            vec![(Address::from_usize(0), Address::from_usize(0), 0x1000)],
            Address::from_usize(0xFFF),
            Metadata::new(),
        );
        memory.add_layer(Box::new(t)).unwrap();
        let err = memory.del_layer("D").unwrap_err();
        assert!(matches!(err, LayerException::Layer(LayerError::DependedUpon(..))));
        assert!(memory.contains("D"));
    }

    #[test]
    fn idempotent_add_then_del() {
        let mut memory = Memory::new();
        assert_eq!(memory.len(), 0);
        memory.add_layer(buffer("a")).unwrap();
        memory.del_layer("a").unwrap();
        assert_eq!(memory.len(), 0);
    }

    #[test]
    fn free_layer_name_finds_smallest_unused() {
        let mut memory = Memory::new();
        memory.add_layer(buffer("layer1")).unwrap();
        memory.add_layer(buffer("layer2")).unwrap();
        assert_eq!(memory.free_layer_name("layer"), "layer3");
    }

    #[test]
    fn check_cycles_passes_for_well_formed_dag() {
        let mut memory = Memory::new();
        memory.add_layer(buffer("D")).unwrap();
        let t = MappedTranslationLayer::new(
            "T",
            "D",
            vec![(Address::from_usize(0), Address::from_usize(0), 0x1000)],
            Address::from_usize(0xFFF),
            Metadata::new(),
        );
        memory.add_layer(Box::new(t)).unwrap();
        assert!(memory.check_cycles().is_ok());
    }
}
