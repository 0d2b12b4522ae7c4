//! Two-area write policy: automatic files are always rewritten, user files
//! are created once and never touched again.

use std::path::Path;

use tracing::debug;

use crate::{application::ports::Filesystem, domain::FileArea, error::ForgeResult};

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Automatic file, (re)written.
    Written,
    /// User file that did not exist yet.
    Created,
    /// User file left as found.
    Preserved,
}

pub struct FilePreservationPolicy<'a> {
    filesystem: &'a dyn Filesystem,
}

impl<'a> FilePreservationPolicy<'a> {
    pub fn new(filesystem: &'a dyn Filesystem) -> Self {
        Self { filesystem }
    }

    pub fn save(&self, area: FileArea, path: &Path, content: &str) -> ForgeResult<SaveOutcome> {
        match area {
            FileArea::Automatic => {
                self.write(path, content)?;
                Ok(SaveOutcome::Written)
            }
            FileArea::User if self.filesystem.exists(path) => {
                debug!(path = %path.display(), "User file exists, preserving");
                Ok(SaveOutcome::Preserved)
            }
            FileArea::User => {
                self.write(path, content)?;
                Ok(SaveOutcome::Created)
            }
        }
    }

    fn write(&self, path: &Path, content: &str) -> ForgeResult<()> {
        if let Some(parent) = path.parent() {
            self.filesystem.create_dir_all(parent)?;
        }
        self.filesystem.write_file(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockFilesystem;

    #[test]
    fn existing_user_files_are_not_written() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().returning(|_| true);
        fs.expect_write_file().never();
        let policy = FilePreservationPolicy::new(&fs);
        let outcome = policy
            .save(FileArea::User, Path::new("/p/tasks/Task.cpp"), "new")
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Preserved);
    }

    #[test]
    fn missing_user_files_are_created() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().returning(|_| false);
        fs.expect_create_dir_all()
            .withf(|path: &Path| path == Path::new("/p/tasks"))
            .times(1)
            .returning(|_| Ok(()));
        fs.expect_write_file().times(1).returning(|_, _| Ok(()));
        let policy = FilePreservationPolicy::new(&fs);
        assert_eq!(
            policy
                .save(FileArea::User, Path::new("/p/tasks/Task.cpp"), "new")
                .unwrap(),
            SaveOutcome::Created
        );
    }

    #[test]
    fn automatic_files_are_always_written() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().never();
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_write_file().times(1).returning(|_, _| Ok(()));
        let policy = FilePreservationPolicy::new(&fs);
        assert_eq!(
            policy
                .save(FileArea::Automatic, Path::new("/p/.orogen/tasks/TaskBase.cpp"), "x")
                .unwrap(),
            SaveOutcome::Written
        );
    }
}
