//! Transformed-tree strategy
//!
//! Units that stayed a syntax tree after the transform stage are rewritten
//! structurally: one traversal, and every import declaration, export-from
//! declaration and dynamic-import call whose specifier resolves is rebuilt
//! with the new string literal while all other fields are preserved. The
//! tree stays a tree; turning it back into text is the writer's concern.

use crate::graph::ModuleGraph;
use crate::rewrite::resolve_request;
use ohmbuild_config::ProjectConfig;
use std::fmt;

/// `import <clause> from '<specifier>'`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportDecl {
    pub clause: String,
    pub specifier: String,
}

/// `export <clause> from '<specifier>'`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportDecl {
    pub clause: String,
    pub is_type_only: bool,
    pub specifier: String,
}

/// `import('<specifier>'[, <extra args>])`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamicImport {
    pub specifier: String,
    pub extra_args: Vec<String>,
}

/// One module item of a transformed syntax tree.
///
/// Only the three specifier-carrying kinds are ever touched by the rewrite;
/// `Raw` nodes are opaque host output and must pass through unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModuleItem {
    Import(ImportDecl),
    ExportFrom(ExportDecl),
    DynamicImport(DynamicImport),
    Raw(String),
}

/// Transformed syntax tree payload of one module unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyntaxTree {
    pub items: Vec<ModuleItem>,
}

impl SyntaxTree {
    pub fn new(items: Vec<ModuleItem>) -> Self {
        Self { items }
    }

    /// Serialize the tree back to source text (writer-side helper).
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            out.push_str(&item.to_string());
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for ModuleItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleItem::Import(decl) => {
                write!(f, "import {} from '{}';", decl.clause, decl.specifier)
            }
            ModuleItem::ExportFrom(decl) => {
                let type_kw = if decl.is_type_only { "type " } else { "" };
                write!(
                    f,
                    "export {}{} from '{}';",
                    type_kw, decl.clause, decl.specifier
                )
            }
            ModuleItem::DynamicImport(call) => {
                write!(f, "import('{}'", call.specifier)?;
                for arg in &call.extra_args {
                    write!(f, ", {}", arg)?;
                }
                write!(f, ");")
            }
            ModuleItem::Raw(text) => write!(f, "{}", text),
        }
    }
}

pub(super) fn process(
    tree: &mut SyntaxTree,
    unit_id: &str,
    graph: &dyn ModuleGraph,
    config: &ProjectConfig,
) {
    for item in &mut tree.items {
        let specifier = match item {
            ModuleItem::Import(decl) => &decl.specifier,
            ModuleItem::ExportFrom(decl) => &decl.specifier,
            ModuleItem::DynamicImport(call) => &call.specifier,
            ModuleItem::Raw(_) => continue,
        };
        let Some(addr) = resolve_request(specifier, unit_id, graph, config) else {
            continue;
        };
        let rewritten = addr.to_specifier();
        match item {
            ModuleItem::Import(decl) => decl.specifier = rewritten,
            ModuleItem::ExportFrom(decl) => decl.specifier = rewritten,
            ModuleItem::DynamicImport(call) => call.specifier = rewritten,
            ModuleItem::Raw(_) => unreachable!(),
        }
    }
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

    fn sample_tree() -> SyntaxTree {
        SyntaxTree::new(vec![
            ModuleItem::Import(ImportDecl {
                clause: "{ f }".to_string(),
                specifier: "./b".to_string(),
            }),
            ModuleItem::ExportFrom(ExportDecl {
                clause: "{ g }".to_string(),
                is_type_only: false,
                specifier: "./c".to_string(),
            }),
            ModuleItem::DynamicImport(DynamicImport {
                specifier: "@ohos.hilog".to_string(),
                extra_args: vec!["options".to_string()],
            }),
            ModuleItem::Raw("const x = 1;".to_string()),
        ])
    }

    #[test]
    fn test_specifier_nodes_rebuilt_fields_preserved() {
        let config = test_config();
        let graph = MemoryModuleGraph::new()
            .with_import("/proj/entry/src/a.ets", "./b", "/proj/entry/src/b.ets")
            .with_import("/proj/entry/src/a.ets", "./c", "/proj/entry/src/c.ets");
        let mut tree = sample_tree();

        process(&mut tree, "/proj/entry/src/a.ets", &graph, &config);

        assert_eq!(
            tree.items[0],
            ModuleItem::Import(ImportDecl {
                clause: "{ f }".to_string(),
                specifier: "@bundle:com.example.app/entry/entry/src/b".to_string(),
            })
        );
        assert_eq!(
            tree.items[1],
            ModuleItem::ExportFrom(ExportDecl {
                clause: "{ g }".to_string(),
                is_type_only: false,
                specifier: "@bundle:com.example.app/entry/entry/src/c".to_string(),
            })
        );
        // system request resolves without a graph entry, extra args survive
        assert_eq!(
            tree.items[2],
            ModuleItem::DynamicImport(DynamicImport {
                specifier: "@ohos:hilog".to_string(),
                extra_args: vec!["options".to_string()],
            })
        );
        assert_eq!(tree.items[3], ModuleItem::Raw("const x = 1;".to_string()));
    }

    #[test]
    fn test_unresolvable_tree_is_structurally_unchanged() {
        let config = test_config();
        let graph = MemoryModuleGraph::new();
        let mut tree = SyntaxTree::new(vec![
            ModuleItem::Import(ImportDecl {
                clause: "ts".to_string(),
                specifier: "typescript".to_string(),
            }),
            ModuleItem::Raw("let y;".to_string()),
        ]);
        let before = tree.clone();
        process(&mut tree, "/proj/entry/src/a.ets", &graph, &config);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_to_source_round_trips_items() {
        let tree = SyntaxTree::new(vec![
            ModuleItem::Import(ImportDecl {
                clause: "x".to_string(),
                specifier: "@ohos:hilog".to_string(),
            }),
            ModuleItem::DynamicImport(DynamicImport {
                specifier: "./b".to_string(),
                extra_args: vec![],
            }),
        ]);
        assert_eq!(
            tree.to_source(),
            "import x from '@ohos:hilog';\nimport('./b');\n"
        );
    }
}
