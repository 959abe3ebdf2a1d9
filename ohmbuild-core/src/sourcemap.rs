//! Source map model and the persistent, file-keyed source-map store
//!
//! A [`SourceMap`] is position-preserving: the rewrite engine only swaps
//! quoted specifier literals inside a line, so the map records one entry at
//! each edit site plus a column-shift entry for the remainder of that line.
//! Lines that no edit touched keep identity positions and need no entry.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One generated-to-original position mapping
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub original_line: u32,
    pub original_column: u32,
}

/// Source map for one rewritten source unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u32,
    /// Base name of the generated file
    pub file: String,
    /// Project-relative path of the original source
    pub sources: Vec<String>,
    /// Mapping entries ordered by generated position
    pub mappings: Vec<Mapping>,
}

impl SourceMap {
    /// Create an empty map for one source file.
    pub fn new(file: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            version: 3,
            file: file.into(),
            sources: vec![source.into()],
            mappings: Vec::new(),
        }
    }

    /// Merge `update` into `self`.
    ///
    /// Entries of `self` on generated lines the update did not touch are
    /// preserved; touched lines are replaced wholesale by the update's
    /// entries. The result stays ordered by generated position.
    pub fn merge(&mut self, update: SourceMap) {
        let touched: BTreeSet<u32> = update.mappings.iter().map(|m| m.generated_line).collect();
        self.mappings.retain(|m| !touched.contains(&m.generated_line));
        self.mappings.extend(update.mappings);
        self.mappings
            .sort_by_key(|m| (m.generated_line, m.generated_column));
        self.file = update.file;
        self.sources = update.sources;
    }
}

/// Mapping from project-relative, slash-normalized file path to that file's
/// current source map.
///
/// Entries accumulate across hot-reload sessions; an entry present before a
/// session starts is merged, never discarded, when its file is touched again.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceMapStore {
    entries: BTreeMap<String, SourceMap>,
}

impl SourceMapStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a freshly generated map into the entry for `relative_path`,
    /// inserting it when no entry exists yet.
    ///
    /// Keys must be project-relative and slash-normalized; the caller is
    /// responsible for never handing in absolute or OS-separator paths.
    pub fn merge_entry(&mut self, relative_path: &str, map: SourceMap) {
        debug_assert!(!relative_path.contains('\\'));
        match self.entries.get_mut(relative_path) {
            Some(existing) => existing.merge(map),
            None => {
                self.entries.insert(relative_path.to_string(), map);
            }
        }
    }

    /// Replace or insert an entry as-is (used when adopting an entry from
    /// another store).
    pub fn insert(&mut self, relative_path: &str, map: SourceMap) {
        debug_assert!(!relative_path.contains('\\'));
        self.entries.insert(relative_path.to_string(), map);
    }

    pub fn get(&self, relative_path: &str) -> Option<&SourceMap> {
        self.entries.get(relative_path)
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.entries.contains_key(relative_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SourceMap)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(line: u32, col: u32) -> Mapping {
        Mapping {
            generated_line: line,
            generated_column: col,
            original_line: line,
            original_column: col,
        }
    }

    #[test]
    fn test_merge_keeps_untouched_lines() {
        let mut base = SourceMap::new("a.js", "src/a.ts");
        base.mappings = vec![mapping(1, 0), mapping(3, 7)];

        let mut update = SourceMap::new("a.js", "src/a.ts");
        update.mappings = vec![mapping(3, 2)];

        base.merge(update);
        assert_eq!(base.mappings, vec![mapping(1, 0), mapping(3, 2)]);
    }

    #[test]
    fn test_merge_stays_ordered() {
        let mut base = SourceMap::new("a.js", "src/a.ts");
        base.mappings = vec![mapping(5, 0)];

        let mut update = SourceMap::new("a.js", "src/a.ts");
        update.mappings = vec![mapping(2, 4)];

        base.merge(update);
        assert_eq!(base.mappings, vec![mapping(2, 4), mapping(5, 0)]);
    }

    #[test]
    fn test_store_merge_entry_inserts_then_merges() {
        let mut store = SourceMapStore::new();
        let mut first = SourceMap::new("a.js", "src/a.ts");
        first.mappings = vec![mapping(1, 0)];
        store.merge_entry("src/a.ts", first);
        assert_eq!(store.len(), 1);

        let mut second = SourceMap::new("a.js", "src/a.ts");
        second.mappings = vec![mapping(2, 0)];
        store.merge_entry("src/a.ts", second);

        let merged = store.get("src/a.ts").unwrap();
        assert_eq!(merged.mappings.len(), 2);
    }

    #[test]
    fn test_store_serializes_as_path_keyed_object() {
        let mut store = SourceMapStore::new();
        store.merge_entry("src/a.ts", SourceMap::new("a.js", "src/a.ts"));
        let json = serde_json::to_value(&store).unwrap();
        assert!(json.get("src/a.ts").is_some());
    }
}
