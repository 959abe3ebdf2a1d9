//! Source File Registry
//!
//! Ordered collection of pending source units for the current build pass.
//! `drain` rewrites and hands off every registered unit exactly once, then
//! clears itself. No cross-unit ordering is guaranteed; units are
//! independent and one unit's rewrite never reads another unit's state.

use crate::error::BuildError;
use crate::graph::ModuleGraph;
use crate::paths::{relative_to, to_unix_path, validate_file_path_length};
use crate::rewrite::{rewrite_unit, ModuleUnit, SourcePayload, SyntaxTree};
use crate::session::BuildSession;
use ohmbuild_config::ProjectConfig;
use ohmbuild_vfs::VirtualFileSystem;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// External writer receiving rewritten units, keyed by payload kind.
pub trait UnitWriter {
    fn write_text(&mut self, id: &str, code: &str) -> Result<(), BuildError>;
    fn write_tree(&mut self, id: &str, tree: &SyntaxTree) -> Result<(), BuildError>;
}

/// Pending units of the current pass.
#[derive(Debug, Default)]
pub struct SourceFileRegistry {
    units: Vec<ModuleUnit>,
}

impl SourceFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one unit for this pass.
    pub fn register(&mut self, unit: ModuleUnit) {
        self.units.push(unit);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Process every registered unit exactly once, then clear the registry.
    ///
    /// In a closed-source ("har") pass only declarations and plain JS are
    /// emitted, so module requests are not rewritten; units still go to the
    /// writer. The registry is emptied up front, so even a failing pass
    /// never processes a unit twice.
    pub fn drain(
        &mut self,
        session: &mut BuildSession,
        graph: &dyn ModuleGraph,
        writer: &mut dyn UnitWriter,
    ) -> Result<(), BuildError> {
        let units = std::mem::take(&mut self.units);
        debug!(count = units.len(), "draining source file registry");
        for mut unit in units {
            if !session.config.compile_har {
                rewrite_unit(&mut unit, graph, &session.config, &mut session.source_maps);
            }
            match &unit.payload {
                SourcePayload::RawText(code)
                | SourcePayload::TransformedText { code, .. } => {
                    writer.write_text(&unit.id, code)?;
                }
                SourcePayload::TransformedTree(tree) => {
                    writer.write_tree(&unit.id, tree)?;
                }
            }
        }
        Ok(())
    }
}

/// Default writer: persists rewritten units under the cache directory,
/// mirroring each unit's project-relative path.
pub struct CacheWriter {
    vfs: Arc<dyn VirtualFileSystem>,
    config: Arc<ProjectConfig>,
}

impl CacheWriter {
    pub fn new(vfs: Arc<dyn VirtualFileSystem>, config: Arc<ProjectConfig>) -> Self {
        Self { vfs, config }
    }

    fn target_path(&self, id: &str) -> Result<PathBuf, BuildError> {
        let rel = relative_to(Path::new(id), &self.config.project_root_path)
            .ok_or_else(|| BuildError::Config(format!("unit outside project root: {}", id)))?;
        let target = self.config.cache_path.join(rel);
        validate_file_path_length(&to_unix_path(&target))?;
        Ok(target)
    }

    fn write(&mut self, id: &str, content: &str) -> Result<(), BuildError> {
        let target = self.target_path(id)?;
        if let Some(parent) = target.parent() {
            self.vfs
                .create_dir_all(parent)
                .map_err(|source| BuildError::WriteFailed {
                    id: id.to_string(),
                    source,
                })?;
        }
        self.vfs
            .write_file(&target, content.as_bytes())
            .map_err(|source| BuildError::WriteFailed {
                id: id.to_string(),
                source,
            })
    }
}

impl UnitWriter for CacheWriter {
    fn write_text(&mut self, id: &str, code: &str) -> Result<(), BuildError> {
        self.write(id, code)
    }

    fn write_tree(&mut self, id: &str, tree: &SyntaxTree) -> Result<(), BuildError> {
        self.write(id, &tree.to_source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryModuleGraph;
    use ohmbuild_vfs::MemoryFileSystem;
    use std::path::PathBuf;

    fn test_config(compile_har: bool) -> ProjectConfig {
        ProjectConfig {
            project_root_path: PathBuf::from("/proj"),
            project_path: PathBuf::from("/proj/entry/src"),
            cache_path: PathBuf::from("/proj/cache"),
            patch_abc_path: PathBuf::from("/proj/patch"),
            changed_file_list: PathBuf::from("/proj/cache/changed.json"),
            bundle_name: "com.example.app".to_string(),
            module_name: "entry".to_string(),
            compile_mode: ohmbuild_config::CompileMode::EsModule,
            compile_har,
            is_preview: false,
            har_alias_map: Default::default(),
            native_modules: Default::default(),
            system_api_declarations: Default::default(),
        }
    }

    #[derive(Default)]
    struct RecordingWriter {
        texts: Vec<(String, String)>,
        trees: Vec<String>,
    }

    impl UnitWriter for RecordingWriter {
        fn write_text(&mut self, id: &str, code: &str) -> Result<(), BuildError> {
            self.texts.push((id.to_string(), code.to_string()));
            Ok(())
        }

        fn write_tree(&mut self, id: &str, _tree: &SyntaxTree) -> Result<(), BuildError> {
            self.trees.push(id.to_string());
            Ok(())
        }
    }

    fn session(compile_har: bool) -> BuildSession {
        BuildSession::new(
            Arc::new(test_config(compile_har)),
            Arc::new(MemoryFileSystem::new()),
        )
    }

    #[test]
    fn test_drain_processes_each_unit_once_and_clears() {
        let mut registry = SourceFileRegistry::new();
        registry.register(ModuleUnit::raw_text(
            "/proj/entry/src/a.js",
            "import x from '@ohos.hilog';",
        ));
        registry.register(ModuleUnit::transformed_tree(
            "/proj/entry/src/b.ets",
            SyntaxTree::default(),
        ));

        let mut session = session(false);
        let graph = MemoryModuleGraph::new();
        let mut writer = RecordingWriter::default();
        registry.drain(&mut session, &graph, &mut writer).unwrap();

        assert!(registry.is_empty());
        assert_eq!(writer.texts.len(), 1);
        assert_eq!(writer.trees, vec!["/proj/entry/src/b.ets".to_string()]);
        // the text unit was rewritten on the way out
        assert_eq!(writer.texts[0].1, "import x from '@ohos:hilog';");

        // a second drain is a no-op
        registry.drain(&mut session, &graph, &mut writer).unwrap();
        assert_eq!(writer.texts.len(), 1);
        assert_eq!(writer.trees.len(), 1);
    }

    #[test]
    fn test_compile_har_skips_rewriting() {
        let mut registry = SourceFileRegistry::new();
        let code = "import x from '@ohos.hilog';";
        registry.register(ModuleUnit::raw_text("/proj/entry/src/a.js", code));

        let mut session = session(true);
        let graph = MemoryModuleGraph::new();
        let mut writer = RecordingWriter::default();
        registry.drain(&mut session, &graph, &mut writer).unwrap();

        assert_eq!(writer.texts[0].1, code);
    }

    #[test]
    fn test_cache_writer_mirrors_relative_path() {
        let vfs = Arc::new(MemoryFileSystem::new());
        let config = Arc::new(test_config(false));
        let mut writer = CacheWriter::new(vfs.clone(), config);
        writer
            .write_text("/proj/entry/src/pages/a.js", "code")
            .unwrap();
        assert!(vfs.is_file(Path::new("/proj/cache/entry/src/pages/a.js")));
    }
}
