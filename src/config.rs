//! The configuration boundary: each
//! layer type declares a list of [`Requirement`]s and can emit a
//! [`ConfigValue`] tree describing its own configuration, which always
//! includes the fully qualified layer type name under `"class"` so the
//! layer could be reconstructed from serialised config by an external
//! loader. Neither requirement validation nor config loading/serialisation
//! is implemented here; this module
//! only fixes the shape of the boundary.

use std::collections::BTreeMap;

/// The kind of value a [`Requirement`] expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementKind {
    Int,
    Str,
    Bool,
    /// Name of another layer this one depends on, e.g. a translation
    /// layer's underlying data layer.
    LayerName,
}

/// One configurable parameter a layer type accepts, analogous to
/// a requirement descriptor,
/// (`requirements.TranslationLayerRequirement`, etc).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub description: String,
    pub kind: RequirementKind,
    pub optional: bool,
}

impl Requirement {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: RequirementKind) -> Self {
        Requirement {
            name: name.into(),
            description: description.into(),
            kind,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// A leaf configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Int(i64),
    Str(String),
    Bool(bool),
}

/// A flat, ordered description of a layer's own configuration, analogous
/// to a hierarchical configuration dict. The well-known key
/// `"class"` carries the fully qualified type identifier of the layer so an
/// external loader could reconstruct it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchicalDict(BTreeMap<String, ConfigValue>);

impl HierarchicalDict {
    pub fn new() -> Self {
        HierarchicalDict(BTreeMap::new())
    }

    /// Builds the base configuration dict for a layer of the given fully
    /// qualified class name, e.g. `"layerfs::layer::data::BufferLayer"`.
    pub fn for_class(class: impl Into<String>) -> Self {
        let mut dict = HierarchicalDict::new();
        dict.set("class", ConfigValue::Str(class.into()));
        dict
    }

    pub fn set(&mut self, key: impl Into<String>, value: ConfigValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.0.get(key)
    }

    pub fn class(&self) -> Option<&str> {
        match self.get("class") {
            Some(ConfigValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_class_sets_class_key() {
        let dict = HierarchicalDict::for_class("layerfs::layer::data::BufferLayer");
        assert_eq!(dict.class(), Some("layerfs::layer::data::BufferLayer"));
    }

    #[test]
    fn requirement_optional_builder() {
        let req = Requirement::new("primary", "Memory layer for the kernel", RequirementKind::LayerName);
        assert!(!req.optional);
        let req = req.optional();
        assert!(req.optional);
    }
}
