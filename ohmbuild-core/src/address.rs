//! Ohm Address Resolver
//!
//! Pure resolution of a module request into a stable, runtime-resolvable
//! address ("ohm URL") independent of file-system layout. Precedence is
//! strict and total: native/system request first, then har alias, then
//! file-derived; the first match wins.

use crate::paths::{relative_to, strip_source_extension};
use once_cell::sync::Lazy;
use ohmbuild_config::{ProjectConfig, PACKAGES};
use regex::Regex;
use std::fmt;
use std::path::Path;
use tracing::warn;

/// Cross-platform API namespace, processed like `ohos` but kept verbatim
/// in the rendered address.
const ARKUI_X_PLUGIN: &str = "arkui-x";

static REG_SYSTEM_MODULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@(system|ohos|arkui-x)\.(\S+)$").unwrap());
static REG_LIB_SO: Lazy<Regex> = Lazy::new(|| Regex::new(r"^lib(\S+)\.so$").unwrap());

/// Prefix of a file-derived address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressPrefix {
    /// The derived path begins with the shared-packages marker
    Package,
    /// Everything else
    Bundle,
}

impl fmt::Display for AddressPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressPrefix::Package => write!(f, "@package:"),
            AddressPrefix::Bundle => write!(f, "@bundle:"),
        }
    }
}

/// A resolved module address
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OhmAddress {
    /// Platform API or native shared library; rendered form is final
    NativeOrSystem(String),
    /// Resolved through the har alias table
    HarAlias(String),
    /// Derived from the target file's project-relative path
    FileDerived { prefix: AddressPrefix, url: String },
}

impl OhmAddress {
    /// Render the address as the specifier string written into source.
    pub fn to_specifier(&self) -> String {
        match self {
            OhmAddress::NativeOrSystem(url) | OhmAddress::HarAlias(url) => url.clone(),
            OhmAddress::FileDerived { prefix, url } => format!("{}{}", prefix, url),
        }
    }
}

impl fmt::Display for OhmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_specifier())
    }
}

/// Resolve one module request.
///
/// `resolved_path` is the statically known target file (if any) and
/// `namespace` the target's owning package name, both supplied by the
/// module-graph collaborator. Returns `None` when the request cannot be
/// resolved in this pass; the caller leaves the original text untouched.
pub fn resolve(
    request: &str,
    resolved_path: Option<&str>,
    namespace: Option<&str>,
    config: &ProjectConfig,
) -> Option<OhmAddress> {
    if let Some(url) = native_or_system_address(request, config) {
        return Some(OhmAddress::NativeOrSystem(url));
    }
    if let Some(url) = har_alias_address(request, config) {
        return Some(OhmAddress::HarAlias(url));
    }
    if let Some(path) = resolved_path {
        return file_derived_address(path, namespace, config);
    }
    None
}

/// Step 1: system/platform APIs and native shared libraries.
///
/// Never consults the resolved path; the request alone determines the
/// address.
fn native_or_system_address(request: &str, config: &ProjectConfig) -> Option<String> {
    let trimmed = request.trim();
    if let Some(caps) = REG_SYSTEM_MODULE.captures(trimmed) {
        let module_type = &caps[1];
        let key = &caps[2];
        let module = format!("{}.{}", module_type, key);
        return Some(if config.native_modules.contains(&module) {
            format!("@native:{}", module)
        } else if module_type == ARKUI_X_PLUGIN {
            format!("@{}.{}", ARKUI_X_PLUGIN, key)
        } else {
            format!("@ohos:{}", key)
        });
    }
    if let Some(caps) = REG_LIB_SO.captures(trimmed) {
        return Some(format!(
            "@app:{}/{}/{}",
            config.bundle_name, config.module_name, &caps[1]
        ));
    }
    None
}

/// Step 2: registered external package aliases.
///
/// An exact request maps directly; a request below a registered har name
/// keeps its sub-path under the alias. When several har names prefix the
/// request the longest one wins, so the most specific registration takes
/// the sub-path.
fn har_alias_address(request: &str, config: &ProjectConfig) -> Option<String> {
    if let Some(alias) = config.har_alias_map.get(request) {
        return Some(alias.clone());
    }
    config
        .har_alias_map
        .iter()
        .filter_map(|(name, alias)| {
            request
                .strip_prefix(name.as_str())
                .and_then(|r| r.strip_prefix('/'))
                .map(|rest| (name.len(), format!("{}/{}", alias, rest)))
        })
        .max_by_key(|(name_len, _)| *name_len)
        .map(|(_, url)| url)
}

/// Step 3: address derived from the target file's path under the project
/// root.
fn file_derived_address(
    path: &str,
    namespace: Option<&str>,
    config: &ProjectConfig,
) -> Option<OhmAddress> {
    let Some(rel) = relative_to(Path::new(path), &config.project_root_path) else {
        warn!(path, "resolved file is outside the project root, skipping rewrite");
        return None;
    };
    let rel = strip_source_extension(&rel);

    let in_packages =
        rel == PACKAGES || rel.starts_with(&format!("{}/", PACKAGES));
    let (prefix, url) = if in_packages {
        (AddressPrefix::Package, rel.to_string())
    } else {
        let url = match namespace {
            Some(ns) if !ns.is_empty() => format!(
                "{}/{}/{}/{}",
                config.bundle_name, config.module_name, ns, rel
            ),
            _ => format!("{}/{}/{}", config.bundle_name, config.module_name, rel),
        };
        (AddressPrefix::Bundle, url)
    };
    Some(OhmAddress::FileDerived { prefix, url })
}
