//! ohmbuild Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all ohmbuild
//! crates: project layout, compile mode flags, the har alias table and
//! the known system-API declaration set.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Reserved directory marker for shared packages.
///
/// A file-derived ohm URL starting with this marker gets the `@package:`
/// prefix instead of `@bundle:`.
pub const PACKAGES: &str = "pkg_modules";

/// Fixed file name of the incremental bytecode bundle inside the patch
/// output directory.
pub const MODULES_ABC: &str = "modules.abc";

/// Fixed file name of the accumulated source-map artifact inside the patch
/// output directory.
pub const SOURCEMAPS: &str = "sourceMaps.map";

/// Fixed file name of the module-usage report written under the cache
/// directory on non-incremental, non-preview builds.
pub const MODULE_COLLECTION: &str = "module_collection.json";

/// Fixed file name of the native-library usage report written under the
/// cache directory on preview builds.
pub const NATIVE_LIB_COLLECTION: &str = "native_lib_collection.json";

/// Output syntax emitted by the bundling host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileMode {
    /// ES module syntax; `require` is not valid in the emitted code
    EsModule,
    /// Legacy bundle syntax; system imports become dynamic-loader calls
    JsBundle,
}

impl CompileMode {
    /// Get the string name of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            CompileMode::EsModule => "esmodule",
            CompileMode::JsBundle => "jsbundle",
        }
    }
}

/// Project configuration consumed by every build pass
///
/// Loaded once at process start (typically from a JSON document by the CLI)
/// and shared read-only across components.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Root of the project tree; all relative paths are derived under it
    pub project_root_path: PathBuf,
    /// Source directory of the compiled module (under the project root)
    pub project_path: PathBuf,
    /// Cache directory for per-unit rewrite output
    pub cache_path: PathBuf,
    /// Patch bundle directory for hot-reload output
    pub patch_abc_path: PathBuf,
    /// Path of the externally produced change-list document
    pub changed_file_list: PathBuf,
    /// Bundle identifier baked into file-derived addresses
    pub bundle_name: String,
    /// Module identifier baked into file-derived addresses
    pub module_name: String,
    /// Output syntax of the bundling host
    pub compile_mode: CompileMode,
    /// Closed-source pass: only declarations and plain JS are emitted,
    /// module requests are not rewritten
    #[serde(default)]
    pub compile_har: bool,
    /// Preview builds skip the module-usage report
    #[serde(default)]
    pub is_preview: bool,
    /// har name -> ohm URL alias table, ordered so resolution walks the
    /// entries the same way on every run
    #[serde(default)]
    pub har_alias_map: BTreeMap<String, String>,
    /// System modules backed by native implementations, as `type.key`
    #[serde(default)]
    pub native_modules: BTreeSet<String>,
    /// Known system-API declaration files, as `@type.key.d.ts`
    #[serde(default)]
    pub system_api_declarations: BTreeSet<String>,
}

impl ProjectConfig {
    /// Both identifiers are needed to qualify a native-library loader call
    pub fn has_bundle_qualifier(&self) -> bool {
        !self.bundle_name.is_empty() && !self.module_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{
            "projectRootPath": "/proj",
            "projectPath": "/proj/entry/src",
            "cachePath": "/proj/cache",
            "patchAbcPath": "/proj/patch",
            "changedFileList": "/proj/cache/changed.json",
            "bundleName": "com.example.app",
            "moduleName": "entry",
            "compileMode": "esmodule"
        }"#;
        let config: ProjectConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.compile_mode, CompileMode::EsModule);
        assert!(!config.compile_har);
        assert!(config.har_alias_map.is_empty());
        assert!(config.has_bundle_qualifier());
    }

    #[test]
    fn test_compile_mode_names() {
        assert_eq!(CompileMode::EsModule.as_str(), "esmodule");
        assert_eq!(CompileMode::JsBundle.as_str(), "jsbundle");
    }
}
