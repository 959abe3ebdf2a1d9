//! Path normalization helpers
//!
//! Every path that ends up in a persisted artifact (source-map keys, patch
//! output) must be project-relative and slash-normalized, independent of the
//! OS separator the bundling host handed us.

use crate::error::BuildError;
use std::path::Path;

/// Longest derived path accepted before a pass is aborted.
pub const MAX_PATH_LENGTH: usize = 4095;

/// Source file extensions stripped when deriving a file-based ohm URL,
/// longest first so `.d.ts` wins over `.ts`.
const SOURCE_EXTENSIONS: [&str; 5] = [".d.ets", ".d.ts", ".ets", ".ts", ".js"];

/// Convert a path to a slash-normalized string.
pub fn to_unix_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Strip a leading `root` from `path`, both slash-normalized.
///
/// Returns `None` when `path` does not live under `root`.
pub fn relative_to(path: &Path, root: &Path) -> Option<String> {
    let path = to_unix_path(path);
    let root = to_unix_path(root);
    let root = root.trim_end_matches('/');
    let rest = path.strip_prefix(root)?;
    let rest = rest.strip_prefix('/')?;
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Drop a known source extension from a slash-normalized path.
pub fn strip_source_extension(path: &str) -> &str {
    for ext in SOURCE_EXTENSIONS {
        if let Some(stripped) = path.strip_suffix(ext) {
            return stripped;
        }
    }
    path
}

/// Reject derived paths exceeding the platform path-length limit.
///
/// Fatal to the current pass per the error taxonomy; callers must validate
/// before any persisted state is mutated.
pub fn validate_file_path_length(path: &str) -> Result<(), BuildError> {
    if path.len() > MAX_PATH_LENGTH {
        return Err(BuildError::PathTooLong {
            path: path.to_string(),
            limit: MAX_PATH_LENGTH,
        });
    }
    Ok(())
}

/// Check whether a module id names a JSON source unit.
pub fn is_json_source(id: &str) -> bool {
    id.ends_with(".json")
}

/// Check whether a module id names an untouched plain-JS source unit.
pub fn is_js_source(id: &str) -> bool {
    id.ends_with(".js")
}
