//! Module-graph query surface
//!
//! The bundling host owns dependency discovery; this core only consumes a
//! narrow read-only view of it: per file id the compiled unit payload, the
//! resolved path of each import request, and the owning namespace of a
//! resolved file. [`MemoryModuleGraph`] is the in-process implementation
//! used by tests and the CLI driver.

use crate::rewrite::ModuleUnit;
use std::collections::{BTreeMap, HashMap};

/// Read-only view of the host's module graph for one build pass.
pub trait ModuleGraph {
    /// Every file id known to the graph, in stable order.
    fn module_ids(&self) -> Vec<String>;

    /// The compiled unit for a file id, if this core should process it.
    fn unit(&self, id: &str) -> Option<ModuleUnit>;

    /// Resolved file path of `request` as imported from `id`, when
    /// statically known.
    fn resolved_import(&self, id: &str, request: &str) -> Option<&str>;

    /// Owning package/module name of a resolved file.
    fn namespace_of(&self, path: &str) -> Option<&str>;
}

/// In-memory module graph built up by a driver or a test fixture.
#[derive(Clone, Debug, Default)]
pub struct MemoryModuleGraph {
    units: BTreeMap<String, ModuleUnit>,
    import_maps: BTreeMap<String, HashMap<String, String>>,
    namespaces: BTreeMap<String, String>,
}

impl MemoryModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a compiled unit.
    pub fn with_unit(mut self, unit: ModuleUnit) -> Self {
        self.units.insert(unit.id.clone(), unit);
        self
    }

    /// Record that `request` imported from `id` resolves to `path`.
    pub fn with_import(
        mut self,
        id: impl Into<String>,
        request: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        self.import_maps
            .entry(id.into())
            .or_default()
            .insert(request.into(), path.into());
        self
    }

    /// Record the owning namespace of a resolved file.
    pub fn with_namespace(mut self, path: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.namespaces.insert(path.into(), namespace.into());
        self
    }

    pub fn insert_unit(&mut self, unit: ModuleUnit) {
        self.units.insert(unit.id.clone(), unit);
    }
}

impl ModuleGraph for MemoryModuleGraph {
    fn module_ids(&self) -> Vec<String> {
        self.units.keys().cloned().collect()
    }

    fn unit(&self, id: &str) -> Option<ModuleUnit> {
        self.units.get(id).cloned()
    }

    fn resolved_import(&self, id: &str, request: &str) -> Option<&str> {
        self.import_maps
            .get(id)
            .and_then(|map| map.get(request))
            .map(String::as_str)
    }

    fn namespace_of(&self, path: &str) -> Option<&str> {
        self.namespaces.get(path).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_graph_queries() {
        let graph = MemoryModuleGraph::new()
            .with_unit(ModuleUnit::raw_text("/p/a.js", "import './b';"))
            .with_import("/p/a.js", "./b", "/p/b.js")
            .with_namespace("/p/b.js", "entry");

        assert_eq!(graph.module_ids(), vec!["/p/a.js".to_string()]);
        assert!(graph.unit("/p/a.js").is_some());
        assert_eq!(graph.resolved_import("/p/a.js", "./b"), Some("/p/b.js"));
        assert_eq!(graph.namespace_of("/p/b.js"), Some("entry"));
        assert_eq!(graph.resolved_import("/p/a.js", "./missing"), None);
    }
}
