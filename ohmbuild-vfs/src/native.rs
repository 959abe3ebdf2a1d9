//! Native file system implementation

use crate::error::VfsResult;
use crate::VirtualFileSystem;
use std::fs;
use std::path::Path;

/// File system backed by the host OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFileSystem;

impl NativeFileSystem {
    /// Create a new native file system.
    pub fn new() -> Self {
        Self
    }
}

impl VirtualFileSystem for NativeFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        Ok(fs::read(path)?)
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        Ok(fs::write(path, content)?)
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        Ok(fs::create_dir_all(path)?)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
