//! VirtualFileSystem trait definition

use crate::error::{VfsError, VfsResult};
use std::path::Path;

/// Virtual File System trait
///
/// Provides a unified interface for the file operations the build pipeline
/// needs, decoupling components from a specific file system implementation.
///
/// # Implementations
/// - `MemoryFileSystem`: In-memory file system for tests
/// - `NativeFileSystem`: Native OS file system
pub trait VirtualFileSystem: Send + Sync {
    /// Read file contents as bytes.
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Write file contents.
    ///
    /// Creates the file if it doesn't exist, truncates it if it does.
    /// The parent directory must already exist.
    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()>;

    /// Create a directory and all missing parents.
    ///
    /// Succeeds if the directory already exists.
    fn create_dir_all(&self, path: &Path) -> VfsResult<()>;

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if a path exists and is a file.
    fn is_file(&self, path: &Path) -> bool;

    /// Check if a path exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Read file contents as a UTF-8 string.
    fn read_to_string(&self, path: &Path) -> VfsResult<String> {
        let bytes = self.read_file(path)?;
        String::from_utf8(bytes).map_err(|_| VfsError::InvalidUtf8 {
            path: path.to_string_lossy().into_owned(),
        })
    }
}
