//! Error types for the build core

use ohmbuild_vfs::VfsError;
use thiserror::Error;

/// Main build error type
///
/// Everything here is fatal to the current pass. Skip conditions (unresolved
/// module request, missing or empty change list, JSON source unit) are not
/// errors and never reach this type.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file system error: {source}")]
    Vfs {
        #[from]
        source: VfsError,
    },

    #[error("cannot create patch output directory '{path}': {source}")]
    PatchDirCreate {
        path: String,
        #[source]
        source: VfsError,
    },

    #[error("derived path exceeds length limit of {limit}: {path}")]
    PathTooLong { path: String, limit: usize },

    #[error("write failed [{id}]: {source}")]
    WriteFailed {
        id: String,
        #[source]
        source: VfsError,
    },

    #[error("bytecode generation failed: {0}")]
    Generator(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for BuildError {
    fn from(err: serde_json::Error) -> Self {
        BuildError::Serialization(err.to_string())
    }
}
