//! Transformed-text strategy
//!
//! The bundling host hands transformed JS text together with a
//! syntax-tree-derived index of exact specifier byte spans. Each resolvable
//! span is replaced by range (not by pattern), then a position-preserving
//! source map for the mutated buffer is regenerated and merged into the
//! store entry for the unit's project-relative path.

use crate::graph::ModuleGraph;
use crate::paths::relative_to;
use crate::rewrite::{resolve_request, SpecifierIndex};
use crate::sourcemap::{Mapping, SourceMap, SourceMapStore};
use ohmbuild_config::ProjectConfig;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

pub(super) fn process(
    code: &mut String,
    index: &SpecifierIndex,
    unit_id: &str,
    graph: &dyn ModuleGraph,
    config: &ProjectConfig,
    source_maps: &mut SourceMapStore,
) {
    // one edit per resolvable span, ascending by start offset
    let mut edits: Vec<(usize, usize, String)> = index
        .iter()
        .filter_map(|span| {
            resolve_request(&span.request, unit_id, graph, config)
                .map(|addr| (span.start, span.end, format!("'{}'", addr.to_specifier())))
        })
        .collect();
    if edits.is_empty() {
        return;
    }
    edits.sort_by_key(|edit| edit.0);

    // mappings are computed against the original buffer before splicing
    let mut mappings: Vec<Mapping> = Vec::with_capacity(edits.len() * 2);
    let mut line_delta: HashMap<u32, i64> = HashMap::new();
    for (start, end, replacement) in &edits {
        let (line, orig_col) = line_col(code, *start);
        let (end_line, orig_end_col) = line_col(code, *end);
        debug_assert_eq!(line, end_line, "specifier literal spans one line");

        let delta_before = line_delta.get(&line).copied().unwrap_or(0);
        mappings.push(Mapping {
            generated_line: line,
            generated_column: shifted(orig_col, delta_before),
            original_line: line,
            original_column: orig_col,
        });

        let delta_after = delta_before + replacement.len() as i64 - (*end - *start) as i64;
        // the rest of the line keeps its original positions, shifted
        mappings.push(Mapping {
            generated_line: line,
            generated_column: shifted(orig_end_col, delta_after),
            original_line: line,
            original_column: orig_end_col,
        });
        line_delta.insert(line, delta_after);
    }

    // splice back to front so earlier offsets stay valid
    for (start, end, replacement) in edits.iter().rev() {
        code.replace_range(*start..*end, replacement.as_str());
    }

    let Some(rel) = relative_to(Path::new(unit_id), &config.project_root_path) else {
        warn!(unit_id, "unit outside the project root, source map not recorded");
        return;
    };
    let file = Path::new(unit_id)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| rel.clone());
    let mut map = SourceMap::new(file, rel.clone());
    map.mappings = mappings;
    source_maps.merge_entry(&rel, map);
}

fn shifted(column: u32, delta: i64) -> u32 {
    (column as i64 + delta).max(0) as u32
}

/// 1-based line and 0-based column of a byte offset.
fn line_col(code: &str, offset: usize) -> (u32, u32) {
    let before = &code[..offset];
    let line = before.bytes().filter(|b| *b == b'\n').count() as u32 + 1;
    let column = (offset - before.rfind('\n').map(|p| p + 1).unwrap_or(0)) as u32;
    (line, column)
}
