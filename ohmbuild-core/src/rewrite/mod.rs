//! Source Rewrite Engine
//!
//! Applies the address resolver to every module request found in one source
//! unit. The unit's payload is a tagged union selecting one of three
//! strategies:
//!
//! - [`SourcePayload::RawText`]: untouched plain JS, scanned with the
//!   request-extraction patterns (no source-map update, positions are
//!   unchanged).
//! - [`SourcePayload::TransformedText`]: transformed JS text plus a
//!   node-derived specifier index giving exact byte spans; replacements are
//!   spliced by range and a position-preserving source map is merged into
//!   the store.
//! - [`SourcePayload::TransformedTree`]: a syntax tree; specifier nodes are
//!   rebuilt in place, serialization stays the writer's responsibility.
//!
//! JSON source units are never rewritten; the check happens before any
//! strategy dispatch.

mod indexed;
mod raw;
mod tree;

pub use tree::{DynamicImport, ExportDecl, ImportDecl, ModuleItem, SyntaxTree};

use crate::address::{self, OhmAddress};
use crate::graph::ModuleGraph;
use crate::paths::is_json_source;
use crate::sourcemap::SourceMapStore;
use ohmbuild_config::ProjectConfig;

/// Byte span of one quoted specifier literal (quotes included) inside a
/// transformed text buffer, as reported by the bundling host's syntax tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpecifierSpan {
    pub start: usize,
    pub end: usize,
    /// The specifier string without quotes
    pub request: String,
}

/// Node index accompanying a [`SourcePayload::TransformedText`] unit.
pub type SpecifierIndex = Vec<SpecifierSpan>;

/// Payload of one compiled source unit; the variant fixes the rewrite
/// strategy and never changes after construction.
#[derive(Clone, Debug, PartialEq)]
pub enum SourcePayload {
    /// Untouched plain JS text
    RawText(String),
    /// Transformed text with exact specifier byte spans
    TransformedText { code: String, index: SpecifierIndex },
    /// Transformed syntax tree
    TransformedTree(SyntaxTree),
}

/// One compiled source file pending address-rewriting and output.
///
/// Lives only for the duration of one build pass.
#[derive(Clone, Debug, PartialEq)]
pub struct ModuleUnit {
    /// Absolute file path, unique per build pass
    pub id: String,
    pub payload: SourcePayload,
}

impl ModuleUnit {
    pub fn raw_text(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: SourcePayload::RawText(code.into()),
        }
    }

    pub fn transformed_text(
        id: impl Into<String>,
        code: impl Into<String>,
        index: SpecifierIndex,
    ) -> Self {
        Self {
            id: id.into(),
            payload: SourcePayload::TransformedText {
                code: code.into(),
                index,
            },
        }
    }

    pub fn transformed_tree(id: impl Into<String>, tree: SyntaxTree) -> Self {
        Self {
            id: id.into(),
            payload: SourcePayload::TransformedTree(tree),
        }
    }
}

/// Rewrite every module request in `unit` to its ohm address.
///
/// Unresolvable requests are left untouched (references to files outside
/// the compiled set are expected). Source maps are only updated by the
/// transformed-text strategy, which is the only one that moves positions'
/// byte ranges around.
pub fn rewrite_unit(
    unit: &mut ModuleUnit,
    graph: &dyn ModuleGraph,
    config: &ProjectConfig,
    source_maps: &mut SourceMapStore,
) {
    if is_json_source(&unit.id) {
        return;
    }
    let id = unit.id.clone();
    match &mut unit.payload {
        SourcePayload::RawText(code) => {
            *code = raw::process(code, &id, graph, config);
        }
        SourcePayload::TransformedText { code, index } => {
            indexed::process(code, index, &id, graph, config, source_maps);
        }
        SourcePayload::TransformedTree(tree) => {
            tree::process(tree, &id, graph, config);
        }
    }
}

/// Resolve one request found in `unit_id`, consulting the module graph for
/// the statically known target path and its owning namespace.
fn resolve_request(
    request: &str,
    unit_id: &str,
    graph: &dyn ModuleGraph,
    config: &ProjectConfig,
) -> Option<OhmAddress> {
    let resolved = graph.resolved_import(unit_id, request);
    let namespace = resolved.and_then(|path| graph.namespace_of(path));
    address::resolve(request, resolved, namespace, config)
}
