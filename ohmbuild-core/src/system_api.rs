//! Legacy System-Import Normalizer
//!
//! A best-effort text pattern matcher over raw source, run before any
//! syntax-tree based stage. It recognizes legacy-syntax references to
//! platform system APIs (`@system.*`, `@ohos.*`, `@arkui-x.*`) and native
//! shared libraries (`lib*.so`) and rewrites them into the runtime's
//! dynamic-loader call form, recording which system/native modules each
//! file uses along the way. It is intentionally not syntax-aware (it is
//! paired with genuinely untyped legacy JS sources); callers interact only
//! with [`normalize`] so a future syntax-aware pass can swap in without
//! changing call sites.

use crate::error::BuildError;
use crate::paths::is_js_source;
use crate::session::BuildSession;
use ohmbuild_config::{CompileMode, MODULE_COLLECTION, NATIVE_LIB_COLLECTION};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::error;

// 'arkui-x' represents cross-platform APIs, processed like 'ohos'.
static REG_SYSTEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"import\s+(.+)\s+from\s+['"]@(system|ohos|arkui-x)\.(\S+)['"]|import\s+(.+?)\s*=\s*require\(\s*['"]@(system|ohos|arkui-x)\.(\S+)['"]\s*\)"#,
    )
    .unwrap()
});

static REG_LIB_SO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"import\s+(.+)\s+from\s+['"]lib(\S+)\.so['"]|import\s+(.+?)\s*=\s*require\(\s*['"]lib(\S+)\.so['"]\s*\)"#,
    )
    .unwrap()
});

static REG_IMPORT_SYSTEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"import\s+(.+)\s+from\s+['"]@(system|ohos|arkui-x)\.(\S+)['"]"#).unwrap()
});

static REG_REQUIRE_SYSTEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"import\s+(.+?)\s*=\s*require\(\s*['"]@(system|ohos|arkui-x)\.(\S+)['"]\s*\)"#)
        .unwrap()
});

const SYSTEM_PLUGIN: &str = "system";
const OHOS_PLUGIN: &str = "ohos";
const ARKUI_X_PLUGIN: &str = "arkui-x";

/// Only open-source application sources are normalized; declaration files
/// never are.
pub fn should_normalize(path: &str) -> bool {
    let is_source =
        path.ends_with(".ets") || path.ends_with(".ts") || path.ends_with(".js");
    is_source && !path.ends_with(".d.ts") && !path.ends_with(".d.ets")
}

/// Normalize legacy system-API and native-library imports in one file.
///
/// Mutates the session's `app_imports` (rebuilt fully for this file) and
/// `native_lib_files`. The sub-mode follows the configured compile mode:
/// direct loader-call rewriting for the legacy bundle format, the indexed
/// record-then-canonicalize pass when ES module syntax is emitted.
pub fn normalize(code: &str, file_path: &str, session: &mut BuildSession) -> String {
    session.app_imports.reset_file(file_path);
    match session.config.compile_mode {
        CompileMode::JsBundle => {
            let code = process_system_api(code, file_path, session);
            process_lib_so(&code, file_path, session)
        }
        CompileMode::EsModule => process_system_api_and_lib_so(code, file_path, session),
    }
}

/// Direct mode: both the import and the require form of a system-API
/// reference become a global dynamic-loader call.
fn process_system_api(code: &str, file_path: &str, session: &mut BuildSession) -> String {
    let config = session.config.clone();
    REG_SYSTEM
        .replace_all(code, |caps: &Captures| {
            let (value, module_type, key) = system_groups(caps);
            let module = format!("{}.{}", module_type, key);
            session.app_imports.record(file_path, module.clone());
            check_module_exists(&module, file_path, session);
            if config.native_modules.contains(&module) {
                format!(
                    "var {} = globalThis.requireNativeModule('{}.{}')",
                    value, module_type, key
                )
            } else if module_type == SYSTEM_PLUGIN
                || module_type == OHOS_PLUGIN
                || module_type == ARKUI_X_PLUGIN
            {
                format!("var {} = globalThis.requireNapi('{}')", value, key)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Rewrite native shared-library imports into the loader-call form,
/// with the bundle/module qualifier only when both are configured.
fn process_lib_so(code: &str, file_path: &str, session: &mut BuildSession) -> String {
    let config = session.config.clone();
    REG_LIB_SO
        .replace_all(code, |caps: &Captures| {
            session.native_lib_files.insert(file_path.to_string());
            let (value, key) = lib_so_groups(caps);
            if config.has_bundle_qualifier() {
                format!(
                    "var {} = globalThis.requireNapi(\"{}\", true, \"{}/{}\");",
                    value, key, config.bundle_name, config.module_name
                )
            } else {
                format!("var {} = globalThis.requireNapi(\"{}\", true);", value, key)
            }
        })
        .into_owned()
}

/// Indexed mode: a read-only pass first records every system-API import so
/// downstream address resolution treats them as native/system references,
/// then only the require-style forms are rewritten into canonical import
/// syntax (`require` is not valid when ES module output is emitted).
/// Native-library imports still become loader calls, as in direct mode.
fn process_system_api_and_lib_so(
    code: &str,
    file_path: &str,
    session: &mut BuildSession,
) -> String {
    for caps in REG_IMPORT_SYSTEM.captures_iter(code) {
        let module = format!("{}.{}", &caps[2], &caps[3]);
        session.app_imports.record(file_path, module);
    }
    let code = REG_REQUIRE_SYSTEM
        .replace_all(code, |caps: &Captures| {
            let (value, module_type, key) = (&caps[1], &caps[2], &caps[3]);
            let module = format!("{}.{}", module_type, key);
            session.app_imports.record(file_path, module.clone());
            check_module_exists(&module, file_path, session);
            format!("import {} from '@{}.{}'", value, module_type, key)
        })
        .into_owned();
    process_lib_so(&code, file_path, session)
}

/// Diagnostic, non-fatal: a plain-JS source referencing an undeclared
/// system API. The build continues.
fn check_module_exists(module: &str, file_path: &str, session: &BuildSession) {
    let declaration = format!("@{}.d.ts", module.trim());
    if is_js_source(file_path) && !session.config.system_api_declarations.contains(&declaration) {
        error!(
            file = file_path,
            "Cannot find module '{}' or its corresponding type declarations.", declaration
        );
    }
}

/// Pull (bound value, module type, key) out of either alternation arm.
fn system_groups<'c>(caps: &'c Captures<'c>) -> (&'c str, &'c str, &'c str) {
    let value = caps.get(1).or_else(|| caps.get(4)).map_or("", |m| m.as_str());
    let module_type = caps.get(2).or_else(|| caps.get(5)).map_or("", |m| m.as_str());
    let key = caps.get(3).or_else(|| caps.get(6)).map_or("", |m| m.as_str());
    (value, module_type, key)
}

fn lib_so_groups<'c>(caps: &'c Captures<'c>) -> (&'c str, &'c str) {
    let value = caps.get(1).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
    let key = caps.get(2).or_else(|| caps.get(4)).map_or("", |m| m.as_str());
    (value, key)
}

/// Persist the per-file module-usage report consumed by packaging steps.
///
/// Skipped on preview builds and on incremental passes; the caller decides
/// when to invoke it.
pub fn write_module_collection(session: &BuildSession) -> Result<(), BuildError> {
    let report = serde_json::to_string_pretty(&session.app_imports)?;
    let target = session.config.cache_path.join(MODULE_COLLECTION);
    session
        .vfs
        .create_dir_all(&session.config.cache_path)
        .map_err(BuildError::from)?;
    session
        .vfs
        .write_file(&target, report.as_bytes())
        .map_err(BuildError::from)
}

/// Persist the set of files that import native shared libraries.
///
/// Written on preview builds only, and only when the pass recorded at
/// least one such file; the caller gates both. The packager consumes it
/// to stage the matching `.so` binaries next to the preview bundle.
pub fn write_native_lib_collection(session: &BuildSession) -> Result<(), BuildError> {
    let report = serde_json::to_string_pretty(&session.native_lib_files)?;
    let target = session.config.cache_path.join(NATIVE_LIB_COLLECTION);
    session
        .vfs
        .create_dir_all(&session.config.cache_path)
        .map_err(BuildError::from)?;
    session
        .vfs
        .write_file(&target, report.as_bytes())
        .map_err(BuildError::from)
}
