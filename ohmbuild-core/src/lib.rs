//! ohmbuild core
//!
//! Module-resolution and incremental-rebuild engine: rewrites every
//! inter-module reference of a compiled source tree into a stable,
//! runtime-resolvable ohm address, normalizes legacy system-API imports,
//! and drives full and hot-reload build passes with a persistent
//! source-map store.

pub mod address;
pub mod error;
pub mod graph;
pub mod hotreload;
pub mod paths;
pub mod registry;
pub mod rewrite;
pub mod session;
pub mod sourcemap;
pub mod system_api;

pub use address::{resolve, AddressPrefix, OhmAddress};
pub use error::BuildError;
pub use graph::{MemoryModuleGraph, ModuleGraph};
pub use hotreload::{BytecodeGenerator, HotReloadController};
pub use paths::{relative_to, strip_source_extension, to_unix_path};
pub use registry::{CacheWriter, SourceFileRegistry, UnitWriter};
pub use rewrite::{
    rewrite_unit, DynamicImport, ExportDecl, ImportDecl, ModuleItem, ModuleUnit, SourcePayload,
    SpecifierIndex, SpecifierSpan, SyntaxTree,
};
pub use session::{AppImportCollection, BuildSession, BuildState};
pub use sourcemap::{Mapping, SourceMap, SourceMapStore};
pub use system_api::{
    normalize, should_normalize, write_module_collection, write_native_lib_collection,
};
