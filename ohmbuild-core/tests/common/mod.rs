//! Shared fixtures for the end-to-end build tests

use ohmbuild_config::{CompileMode, ProjectConfig};
use ohmbuild_core::{BuildError, BuildSession, BytecodeGenerator, SyntaxTree, UnitWriter};
use ohmbuild_vfs::{MemoryFileSystem, VirtualFileSystem};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub fn project_config(mode: CompileMode) -> ProjectConfig {
    ProjectConfig {
        project_root_path: PathBuf::from("/proj"),
        project_path: PathBuf::from("/proj/entry/src"),
        cache_path: PathBuf::from("/proj/cache"),
        patch_abc_path: PathBuf::from("/proj/patch"),
        changed_file_list: PathBuf::from("/proj/cache/changed.json"),
        bundle_name: "com.example.app".to_string(),
        module_name: "entry".to_string(),
        compile_mode: mode,
        compile_har: false,
        is_preview: false,
        har_alias_map: Default::default(),
        native_modules: Default::default(),
        system_api_declarations: Default::default(),
    }
}

pub fn session(mode: CompileMode, vfs: Arc<MemoryFileSystem>) -> BuildSession {
    BuildSession::new(Arc::new(project_config(mode)), vfs)
}

pub fn write_change_list(vfs: &MemoryFileSystem, json: &str) {
    vfs.write_file(Path::new("/proj/cache/changed.json"), json.as_bytes())
        .unwrap();
}

/// Writer that records everything it is handed.
#[derive(Default)]
pub struct RecordingWriter {
    pub texts: Vec<(String, String)>,
    pub trees: Vec<(String, SyntaxTree)>,
}

impl UnitWriter for RecordingWriter {
    fn write_text(&mut self, id: &str, code: &str) -> Result<(), BuildError> {
        self.texts.push((id.to_string(), code.to_string()));
        Ok(())
    }

    fn write_tree(&mut self, id: &str, tree: &SyntaxTree) -> Result<(), BuildError> {
        self.trees.push((id.to_string(), tree.clone()));
        Ok(())
    }
}

/// Generator that records each invocation instead of producing bytecode.
#[derive(Default)]
pub struct RecordingGenerator {
    pub calls: Vec<(PathBuf, Vec<String>)>,
}

impl BytecodeGenerator for RecordingGenerator {
    fn generate(&mut self, output: &Path, module_ids: &[String]) -> Result<(), BuildError> {
        self.calls.push((output.to_path_buf(), module_ids.to_vec()));
        Ok(())
    }
}
