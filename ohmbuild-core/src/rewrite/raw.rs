//! Raw-text strategy
//!
//! Plain JS units arrive without a syntax tree, so module requests are
//! found with two text patterns: static import/export-from specifiers and
//! dynamic `import()` call specifiers. Only the quoted specifier substring
//! of a match is swapped; surrounding code is untouched, so positions do
//! not move and no source-map update is needed.

use crate::graph::ModuleGraph;
use crate::rewrite::resolve_request;
use once_cell::sync::Lazy;
use ohmbuild_config::ProjectConfig;
use regex::{Captures, Regex};

static REG_DEPENDENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:import|from)\s*['"]([^'"]+)['"]|import\s*\(\s*['"]([^'"]+)['"]\s*\)"#)
        .unwrap()
});

static REG_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(['"])[^'"]*['"]"#).unwrap());

pub(super) fn process(
    code: &str,
    unit_id: &str,
    graph: &dyn ModuleGraph,
    config: &ProjectConfig,
) -> String {
    REG_DEPENDENCY
        .replace_all(code, |caps: &Captures| {
            let item = &caps[0];
            let request = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match resolve_request(request, unit_id, graph, config) {
                Some(addr) => {
                    let specifier = addr.to_specifier();
                    REG_QUOTED
                        .replace(item, |quoted: &Captures| {
                            format!("{}{}{}", &quoted[1], specifier, &quoted[1])
                        })
                        .into_owned()
                }
                None => item.to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryModuleGraph;
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
    fn test_static_import_rewritten() {
        let config = test_config();
        let graph = MemoryModuleGraph::new().with_import(
            "/proj/entry/src/a.js",
            "./b",
            "/proj/entry/src/b.js",
        );
        let out = process(
            "import { f } from './b';\n",
            "/proj/entry/src/a.js",
            &graph,
            &config,
        );
        assert_eq!(
            out,
            "import { f } from '@bundle:com.example.app/entry/entry/src/b';\n"
        );
    }

    #[test]
    fn test_dynamic_import_rewritten_keeping_quote_kind() {
        let config = test_config();
        let graph = MemoryModuleGraph::new().with_import(
            "/proj/entry/src/a.js",
            "./b",
            "/proj/entry/src/b.js",
        );
        let out = process(
            "const m = import(\"./b\");",
            "/proj/entry/src/a.js",
            &graph,
            &config,
        );
        assert_eq!(
            out,
            "const m = import(\"@bundle:com.example.app/entry/entry/src/b\");"
        );
    }

    #[test]
    fn test_system_import_rewritten_without_graph_entry() {
        let config = test_config();
        let graph = MemoryModuleGraph::new();
        let out = process(
            "import hilog from '@ohos.hilog';",
            "/proj/entry/src/a.js",
            &graph,
            &config,
        );
        assert_eq!(out, "import hilog from '@ohos:hilog';");
    }

    #[test]
    fn test_unresolved_request_left_untouched() {
        let config = test_config();
        let graph = MemoryModuleGraph::new();
        let code = "import ts from 'typescript';";
        assert_eq!(process(code, "/proj/entry/src/a.js", &graph, &config), code);
    }
}
