//! The real disk.

use std::io;
use std::path::Path;

use taskforge_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{ForgeError, ForgeResult},
};

#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn create_dir_all(&self, path: &Path) -> ForgeResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn write_file(&self, path: &Path, content: &str) -> ForgeResult<()> {
        std::fs::write(path, content).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn read_file(&self, path: &Path) -> ForgeResult<String> {
        std::fs::read_to_string(path).map_err(|e| map_io_error(path, e, "read file"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn symlink(&self, target: &Path, link: &Path) -> ForgeResult<()> {
        // symlink_metadata sees dangling links too
        if link.symlink_metadata().is_ok() {
            std::fs::remove_file(link).map_err(|e| map_io_error(link, e, "replace link"))?;
        }
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(target, link)
                .map_err(|e| map_io_error(link, e, "create link"))
        }
        #[cfg(windows)]
        {
            std::os::windows::fs::symlink_file(target, link)
                .map_err(|e| map_io_error(link, e, "create link"))
        }
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> ForgeError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_and_reads_back() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();
        let file = dir.path().join("a/b/Task.hpp");

        fs.create_dir_all(file.parent().unwrap()).unwrap();
        fs.write_file(&file, "class Task;").unwrap();

        assert!(fs.exists(&file));
        assert_eq!(fs.read_file(&file).unwrap(), "class Task;");
    }

    #[test]
    fn reading_a_missing_file_is_a_filesystem_error() {
        let dir = TempDir::new().unwrap();
        let err = LocalFilesystem::new()
            .read_file(&dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Application(ApplicationError::FilesystemError { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn links_are_replaced() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();
        let first = dir.path().join("first.hpp");
        let second = dir.path().join("second.hpp");
        let link = dir.path().join("link.hpp");
        fs.write_file(&first, "1").unwrap();
        fs.write_file(&second, "2").unwrap();

        fs.symlink(&first, &link).unwrap();
        fs.symlink(&second, &link).unwrap();

        assert_eq!(std::fs::read_link(&link).unwrap(), second);
        assert_eq!(fs.read_file(&link).unwrap(), "2");
    }
}
