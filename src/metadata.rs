//! Metadata chain: each layer's effective metadata is its own direct
//! metadata overlaid on top of the metadata of each of its dependencies,
//! in dependency order. Key collisions resolve in favour of the nearer
//! layer (self over dependencies, earlier dependency over later).

use std::collections::BTreeMap;

/// Keys every layer's metadata defaults to, if not overridden.
pub const DEFAULT_METADATA: &[(&str, &str)] = &[("architecture", "Unknown"), ("os", "Unknown")];

/// The metadata a single layer declares for itself, not including anything
/// inherited from dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    pub fn new() -> Self {
        let mut map = BTreeMap::new();
        for (k, v) in DEFAULT_METADATA {
            map.insert((*k).to_string(), (*v).to_string());
        }
        Metadata(map)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merges `self` over `dependencies` (in order), so that `self` wins
    /// ties, and earlier dependencies win over later ones.
    pub fn merged_over(&self, dependencies: impl IntoIterator<Item = Metadata>) -> Metadata {
        // Build from the furthest dependency forward so nearer sources overwrite.
        let mut layers: Vec<Metadata> = dependencies.into_iter().collect();
        layers.reverse();
        let mut merged = BTreeMap::new();
        for dep in &layers {
            for (k, v) in dep.0.iter() {
                merged.insert(k.clone(), v.clone());
            }
        }
        for (k, v) in self.0.iter() {
            merged.insert(k.clone(), v.clone());
        }
        Metadata(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_present() {
        let m = Metadata::new();
        assert_eq!(m.get("architecture"), Some("Unknown"));
        assert_eq!(m.get("os"), Some("Unknown"));
    }

    #[test]
    fn merge_prefers_nearer_layer() {
        // L has direct {os: Linux}; its dependency M has {os: Windows, arch: x64}.
        let l = Metadata::new().with("os", "Linux");
        let m = Metadata::new().with("os", "Windows").with("arch", "x64");
        let merged = l.merged_over([m]);
        assert_eq!(merged.get("os"), Some("Linux"));
        assert_eq!(merged.get("arch"), Some("x64"));
    }

    #[test]
    fn merge_chain_order() {
        let near = Metadata::new().with("k", "near");
        let mid = Metadata::new().with("k", "mid").with("j", "mid");
        let far = Metadata::new().with("k", "far").with("j", "far").with("i", "far");
        let merged = near.merged_over([mid, far]);
        assert_eq!(merged.get("k"), Some("near"));
        assert_eq!(merged.get("j"), Some("mid"));
        assert_eq!(merged.get("i"), Some("far"));
    }
}
