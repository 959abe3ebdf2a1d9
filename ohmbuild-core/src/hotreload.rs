//! Hot-Reload Build Controller
//!
//! Two-state machine over the session's [`BuildState`]: the first
//! invocation compiles every unit the module graph knows and initializes
//! the source-map baseline; every later invocation compiles only the files
//! named by the externally produced change-list document and emits a
//! separate patch bundle. The accumulated, file-keyed source-map store is
//! rewritten in full to the patch directory on every incremental pass, so
//! mappings captured in earlier sessions are never lost.
//!
//! A missing or empty change list degrades to a logged skip. Everything
//! else fatal (unwritable patch directory, oversized derived paths) aborts
//! the pass before the shared source-map store is touched.

use crate::error::BuildError;
use crate::graph::ModuleGraph;
use crate::paths::{relative_to, to_unix_path, validate_file_path_length};
use crate::registry::{SourceFileRegistry, UnitWriter};
use crate::session::{BuildSession, BuildState};
use crate::sourcemap::SourceMapStore;
use ohmbuild_config::{MODULES_ABC, SOURCEMAPS};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Blocking external bytecode generation call; completion gates the next
/// pass, no cancellation is defined.
pub trait BytecodeGenerator {
    fn generate(&mut self, output: &Path, module_ids: &[String]) -> Result<(), BuildError>;
}

/// Shape of the externally produced change-list document.
#[derive(Debug, Default, Deserialize)]
struct ChangeList {
    #[serde(default, rename = "modifiedFiles")]
    modified_files: Vec<String>,
}

/// Drives full and incremental passes and owns the persistent source-map
/// accumulation written to the patch output location.
#[derive(Default)]
pub struct HotReloadController {
    accumulated: SourceMapStore,
}

impl HotReloadController {
    pub fn new() -> Self {
        Self::default()
    }

    /// The store as persisted to the patch directory.
    pub fn accumulated_source_maps(&self) -> &SourceMapStore {
        &self.accumulated
    }

    /// Run one build pass.
    ///
    /// The normalizer stage has already run by the time this is invoked;
    /// the driver calls [`BuildSession::begin_pass`] before that stage,
    /// not here.
    pub fn generate_abc(
        &mut self,
        session: &mut BuildSession,
        graph: &dyn ModuleGraph,
        writer: &mut dyn UnitWriter,
        generator: &mut dyn BytecodeGenerator,
    ) -> Result<(), BuildError> {
        match session.state() {
            BuildState::FirstBuild => {
                self.compile_all_files(session, graph, writer, generator)?;
                session.advance_to_incremental();
                Ok(())
            }
            BuildState::Incremental => {
                self.compile_change_list_files(session, graph, writer, generator)
            }
        }
    }

    fn compile_all_files(
        &mut self,
        session: &mut BuildSession,
        graph: &dyn ModuleGraph,
        writer: &mut dyn UnitWriter,
        generator: &mut dyn BytecodeGenerator,
    ) -> Result<(), BuildError> {
        let module_ids = graph.module_ids();
        info!(count = module_ids.len(), "first build, compiling all files");

        let mut registry = SourceFileRegistry::new();
        for id in &module_ids {
            if let Some(unit) = graph.unit(id) {
                registry.register(unit);
            }
        }
        registry.drain(session, graph, writer)?;

        // source-map baseline for later incremental passes
        self.accumulated = session.source_maps.clone();

        let output = session.config.cache_path.join(MODULES_ABC);
        validate_file_path_length(&to_unix_path(&output))?;
        generator.generate(&output, &module_ids)
    }

    fn compile_change_list_files(
        &mut self,
        session: &mut BuildSession,
        graph: &dyn ModuleGraph,
        writer: &mut dyn UnitWriter,
        generator: &mut dyn BytecodeGenerator,
    ) -> Result<(), BuildError> {
        let config = session.config.clone();

        let list_path = &config.changed_file_list;
        if !session.vfs.exists(list_path) {
            debug!(
                path = %list_path.display(),
                "cannot find change list, skip hot reload build"
            );
            return Ok(());
        }
        let list_json = session.vfs.read_to_string(list_path)?;
        let change_list: ChangeList = serde_json::from_str(&list_json)?;
        if change_list.modified_files.is_empty() {
            debug!("no changed files found, skip hot reload build");
            return Ok(());
        }

        if !session.vfs.exists(&config.patch_abc_path) {
            session
                .vfs
                .create_dir_all(&config.patch_abc_path)
                .map_err(|source| BuildError::PatchDirCreate {
                    path: to_unix_path(&config.patch_abc_path),
                    source,
                })?;
        }

        // validate every derived path before the shared store is mutated
        let relative_project = relative_to(&config.project_path, &config.project_root_path)
            .unwrap_or_default();
        let mut map_keys = Vec::with_capacity(change_list.modified_files.len());
        for file in &change_list.modified_files {
            let key = join_unix(&relative_project, file);
            validate_file_path_length(&key)?;
            map_keys.push(key);
        }
        let map_path = config.patch_abc_path.join(SOURCEMAPS);
        validate_file_path_length(&to_unix_path(&map_path))?;
        let abc_path = config.patch_abc_path.join(MODULES_ABC);
        validate_file_path_length(&to_unix_path(&abc_path))?;

        self.update_source_map_from_file_list(session, &map_keys, &map_path)?;

        let mut registry = SourceFileRegistry::new();
        let mut module_ids = Vec::with_capacity(change_list.modified_files.len());
        for file in &change_list.modified_files {
            let id = to_unix_path(&config.project_path.join(file));
            if let Some(unit) = graph.unit(&id) {
                registry.register(unit);
            } else {
                debug!(id, "changed file not present in module graph");
            }
            module_ids.push(id);
        }
        registry.drain(session, graph, writer)?;

        generator.generate(&abc_path, &module_ids)
    }

    /// Adopt the session's current map for every changed file into the
    /// persistent store, then rewrite the whole store file. Entries of
    /// files this pass did not touch carry over untouched.
    fn update_source_map_from_file_list(
        &mut self,
        session: &BuildSession,
        map_keys: &[String],
        map_path: &PathBuf,
    ) -> Result<(), BuildError> {
        for key in map_keys {
            if let Some(map) = session.source_maps.get(key) {
                self.accumulated.merge_entry(key, map.clone());
            }
        }
        let serialized = serde_json::to_string_pretty(&self.accumulated)?;
        session
            .vfs
            .write_file(map_path, serialized.as_bytes())
            .map_err(BuildError::from)
    }
}

fn join_unix(base: &str, rest: &str) -> String {
    let rest = rest.replace('\\', "/");
    if base.is_empty() {
        rest
    } else {
        format!("{}/{}", base.trim_end_matches('/'), rest)
    }
}
