use super::types::Resource;

use std::collections::BTreeMap;

/// Read-only map of all corpora known to the gateway.
///
/// Backed by a `BTreeMap` so every iteration is sorted by resource id. The
/// fan-out code relies on this to merge per-corpus results deterministically.
pub struct ResourceRegistry {
    resources: BTreeMap<String, Resource>,
}

impl ResourceRegistry {
    pub fn new(resources: BTreeMap<String, Resource>) -> Self {
        Self { resources }
    }

    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.resources.contains_key(id)
    }

    /// All resource ids, sorted.
    pub fn get_all(&self) -> Vec<String> {
        self.resources.keys().cloned().collect()
    }

    pub fn get_registry_path(&self, id: &str) -> Option<&str> {
        self.resources.get(id).map(|r| r.registry_path.as_str())
    }

    /// Positional attribute names shared by all of the given corpora,
    /// preserving the order they appear in the first corpus.
    ///
    /// Unknown ids contribute an empty attribute set, so the intersection
    /// collapses to nothing; callers validate ids beforehand.
    pub fn common_pos_attrs(&self, ids: &[String]) -> Vec<String> {
        let Some(first) = ids.first().and_then(|id| self.resources.get(id)) else {
            return Vec::new();
        };

        first
            .pos_attrs
            .iter()
            .filter(|attr| {
                ids[1..].iter().all(|id| {
                    self.resources
                        .get(id)
                        .map(|r| r.pos_attrs.contains(attr))
                        .unwrap_or(false)
                })
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
