//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// An in-memory file system implementation.
///
/// Files are stored in a `BTreeMap` keyed by slash-normalized path strings,
/// making it suitable for testing and scenarios where disk access is not
/// desired. Directories created through [`create_dir_all`] are tracked
/// explicitly so that `is_dir` behaves like a real file system.
///
/// [`create_dir_all`]: VirtualFileSystem::create_dir_all
///
/// # Example
/// ```
/// use ohmbuild_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.write_file(Path::new("/test.txt"), b"hello").unwrap();
/// assert!(fs.is_file(Path::new("/test.txt")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    dirs: Arc<RwLock<BTreeSet<String>>>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new memory file system pre-populated with files.
    ///
    /// # Arguments
    /// * `files` - Iterator of (path, content) tuples
    pub fn with_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let fs = Self::new();
        {
            let mut map = fs.files.write().unwrap();
            for (path, content) in files {
                map.insert(normalize_path(Path::new(path.as_ref())), content);
            }
        }
        fs
    }
}

/// Normalize a path string for internal storage.
/// Uses forward slashes consistently for cross-platform comparability.
fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn poisoned() -> VfsError {
    VfsError::Custom {
        message: String::from("Lock poisoned"),
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let normalized = normalize_path(path);
        let files = self.files.read().map_err(|_| poisoned())?;
        files
            .get(&normalized)
            .cloned()
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let normalized = normalize_path(path);
        let mut files = self.files.write().map_err(|_| poisoned())?;
        files.insert(normalized, content.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        let normalized = normalize_path(path);
        let mut dirs = self.dirs.write().map_err(|_| poisoned())?;
        // record every ancestor so is_dir works on intermediate segments
        let mut prefix = String::new();
        for segment in normalized.split('/').filter(|s| !s.is_empty()) {
            prefix.push('/');
            prefix.push_str(segment);
            dirs.insert(prefix.clone());
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let normalized = normalize_path(path);
        self.files
            .read()
            .map(|files| files.contains_key(&normalized))
            .unwrap_or(false)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let normalized = normalize_path(path);
        let explicit = self
            .dirs
            .read()
            .map(|dirs| dirs.contains(&normalized))
            .unwrap_or(false);
        if explicit {
            return true;
        }
        // a directory also exists implicitly when any file lives below it
        let prefix = format!("{}/", normalized);
        self.files
            .read()
            .map(|files| files.keys().any(|k| k.starts_with(&prefix)))
            .unwrap_or(false)
    }
}
