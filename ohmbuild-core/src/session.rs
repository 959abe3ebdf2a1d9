//! Build session state
//!
//! All process-wide mutable state lives on one explicit [`BuildSession`]
//! passed by reference into every component, with a single-pass lifecycle:
//! `begin_pass` resets the per-pass collections, the pass runs to
//! completion, and nothing reads the session mid-mutation (the whole system
//! is single-threaded and pass-oriented).

use crate::sourcemap::SourceMapStore;
use ohmbuild_config::ProjectConfig;
use ohmbuild_vfs::VirtualFileSystem;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Process-wide build phase.
///
/// Advances exactly once, from `FirstBuild` to `Incremental`, after the
/// first successful full compilation, and never reverts within one process
/// lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildState {
    FirstBuild,
    Incremental,
}

/// Per-file record of the system/native modules a source references.
///
/// Rebuilt fully on every normalizer pass over a file, consumed by
/// downstream packaging steps.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AppImportCollection {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl AppImportCollection {
    /// Start a fresh (empty) record for `file`, discarding any previous one.
    pub fn reset_file(&mut self, file: &str) {
        self.entries.insert(file.to_string(), BTreeSet::new());
    }

    /// Record that `file` references the system/native `module`.
    pub fn record(&mut self, file: &str, module: impl Into<String>) {
        self.entries
            .entry(file.to_string())
            .or_default()
            .insert(module.into());
    }

    pub fn get(&self, file: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(file)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// State shared across a watch-mode session.
pub struct BuildSession {
    /// Read-only project configuration
    pub config: Arc<ProjectConfig>,
    /// File system used for every I/O of the pass
    pub vfs: Arc<dyn VirtualFileSystem>,
    /// Build phase, monotonically advancing
    state: BuildState,
    /// Source maps produced by the rewrite engine in this session
    pub source_maps: SourceMapStore,
    /// System/native module usage per file, scoped to one pass
    pub app_imports: AppImportCollection,
    /// Files that import native shared libraries, scoped to one pass
    pub native_lib_files: BTreeSet<String>,
}

impl BuildSession {
    pub fn new(config: Arc<ProjectConfig>, vfs: Arc<dyn VirtualFileSystem>) -> Self {
        Self {
            config,
            vfs,
            state: BuildState::FirstBuild,
            source_maps: SourceMapStore::new(),
            app_imports: AppImportCollection::default(),
            native_lib_files: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Reset the pass-scoped collections. Source maps persist across passes.
    pub fn begin_pass(&mut self) {
        self.app_imports.clear();
        self.native_lib_files.clear();
    }

    /// Enter `Incremental` after the first successful full compilation.
    /// Idempotent; the state never moves back.
    pub fn advance_to_incremental(&mut self) {
        self.state = BuildState::Incremental;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ohmbuild_vfs::MemoryFileSystem;
    use std::path::PathBuf;

    fn test_config() -> ProjectConfig {
        ProjectConfig {
            project_root_path: PathBuf::from("/proj"),
            project_path: PathBuf::from("/proj/entry/src"),
            cache_path: PathBuf::from("/proj/cache"),
            patch_abc_path: PathBuf::from("/proj/patch"),
            changed_file_list: PathBuf::from("/proj/cache/changed.json"),
            bundle_name: "com.example.app".to_string(),
            module_name: "entry".to_string(),
            compile_mode: ohmbuild_config::CompileMode::EsModule,
            compile_har: false,
            is_preview: false,
            har_alias_map: Default::default(),
            native_modules: Default::default(),
            system_api_declarations: Default::default(),
        }
    }

    #[test]
    fn test_state_advances_once_and_stays() {
        let mut session =
            BuildSession::new(Arc::new(test_config()), Arc::new(MemoryFileSystem::new()));
        assert_eq!(session.state(), BuildState::FirstBuild);
        session.advance_to_incremental();
        assert_eq!(session.state(), BuildState::Incremental);
        session.advance_to_incremental();
        assert_eq!(session.state(), BuildState::Incremental);
    }

    #[test]
    fn test_begin_pass_resets_collections_not_maps() {
        let mut session =
            BuildSession::new(Arc::new(test_config()), Arc::new(MemoryFileSystem::new()));
        session.app_imports.record("a.ts", "ohos.hilog");
        session.native_lib_files.insert("a.ts".to_string());
        session
            .source_maps
            .merge_entry("entry/src/a.ts", crate::sourcemap::SourceMap::new("a.js", "entry/src/a.ts"));

        session.begin_pass();
        assert!(session.app_imports.is_empty());
        assert!(session.native_lib_files.is_empty());
        assert_eq!(session.source_maps.len(), 1);
    }

    #[test]
    fn test_app_import_collection_rebuild() {
        let mut imports = AppImportCollection::default();
        imports.record("a.ts", "ohos.hilog");
        imports.reset_file("a.ts");
        assert!(imports.get("a.ts").unwrap().is_empty());
        imports.record("a.ts", "system.app");
        assert!(imports.get("a.ts").unwrap().contains("system.app"));
    }
}
