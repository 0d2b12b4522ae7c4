//! In-memory filesystem adapter for testing and dry runs.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use taskforge_core::{
    application::{ApplicationError, ports::Filesystem},
    error::ForgeResult,
};

/// In-memory filesystem.
///
/// Backs `taskforge generate --dry-run`: nothing touches the disk, and the
/// files that would have been written can be listed afterwards.
#[derive(Debug, Clone)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: HashMap<PathBuf, String>,
    directories: HashSet<PathBuf>,
    links: BTreeMap<PathBuf, PathBuf>,
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryFilesystemInner::default())),
        }
    }

    /// Seed a file, creating its parent directories.
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) -> ForgeResult<()> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent)?;
        }
        self.write_file(&path, &content.into())
    }

    /// A file's content, if present.
    pub fn content(&self, path: &Path) -> Option<String> {
        let inner = self.inner.read().ok()?;
        inner.files.get(path).cloned()
    }

    /// All files, sorted.
    pub fn list_files(&self) -> Vec<PathBuf> {
        let Ok(inner) = self.inner.read() else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = inner.files.keys().cloned().collect();
        files.sort();
        files
    }

    /// All links as `(link, target)`, sorted by link.
    pub fn list_links(&self) -> Vec<(PathBuf, PathBuf)> {
        let Ok(inner) = self.inner.read() else {
            return Vec::new();
        };
        inner
            .links
            .iter()
            .map(|(link, target)| (link.clone(), target.clone()))
            .collect()
    }
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for MemoryFilesystem {
    fn create_dir_all(&self, path: &Path) -> ForgeResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;

        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            inner.directories.insert(current.clone());
        }

        Ok(())
    }

    fn write_file(&self, path: &Path, content: &str) -> ForgeResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !inner.directories.contains(parent) {
                return Err(ApplicationError::FilesystemError {
                    path: path.to_path_buf(),
                    reason: "Parent directory does not exist".into(),
                }
                .into());
            }
        }

        inner.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn read_file(&self, path: &Path) -> ForgeResult<String> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;
        let resolved = inner.links.get(path).map_or(path, PathBuf::as_path);
        inner.files.get(resolved).cloned().ok_or_else(|| {
            ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "No such file".into(),
            }
            .into()
        })
    }

    fn exists(&self, path: &Path) -> bool {
        let Ok(inner) = self.inner.read() else {
            return false;
        };
        inner.files.contains_key(path)
            || inner.directories.contains(path)
            || inner.links.contains_key(path)
    }

    fn symlink(&self, target: &Path, link: &Path) -> ForgeResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        inner.links.insert(link.to_path_buf(), target.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writing_requires_the_parent_directory() {
        let fs = MemoryFilesystem::new();
        assert!(fs.write_file(Path::new("/p/tasks/Task.hpp"), "").is_err());

        fs.create_dir_all(Path::new("/p/tasks")).unwrap();
        fs.write_file(Path::new("/p/tasks/Task.hpp"), "x").unwrap();
        assert!(fs.exists(Path::new("/p")));
        assert_eq!(fs.list_files(), [PathBuf::from("/p/tasks/Task.hpp")]);
    }

    #[test]
    fn links_resolve_on_read() {
        let fs = MemoryFilesystem::new();
        fs.insert("/p/tasks/Task.hpp", "class Task;").unwrap();
        fs.symlink(Path::new("/p/tasks/Task.hpp"), Path::new("/p/.orogen/demo/Task.hpp"))
            .unwrap();

        assert!(fs.exists(Path::new("/p/.orogen/demo/Task.hpp")));
        assert_eq!(
            fs.read_file(Path::new("/p/.orogen/demo/Task.hpp")).unwrap(),
            "class Task;"
        );
        assert_eq!(fs.list_links().len(), 1);
    }
}
