use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::domain::error::DomainError;

/// Which preservation rule applies to a generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileArea {
    /// Rewritten on every run.
    Automatic,
    /// Written once; left alone while it exists.
    User,
}

/// Files produced for one task, ready to be saved.
///
/// Paths are relative to the project base directory. This is the output of
/// rendering and contains no logic beyond structural validation.
#[derive(Debug, Clone, Default)]
pub struct GeneratedFiles {
    pub(crate) entries: Vec<FileToWrite>,
    pub(crate) links: Vec<LinkToCreate>,
}

impl GeneratedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, area: FileArea, path: impl Into<PathBuf>, content: String) {
        self.entries.push(FileToWrite {
            area,
            path: path.into(),
            content,
        });
    }

    pub fn add_link(&mut self, link: impl Into<PathBuf>, target: impl Into<PathBuf>) {
        self.links.push(LinkToCreate {
            link: link.into(),
            target: target.into(),
        });
    }

    pub fn with_file(mut self, area: FileArea, path: impl Into<PathBuf>, content: String) -> Self {
        self.add_file(area, path, content);
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        let paths = self
            .entries
            .iter()
            .map(|f| &f.path)
            .chain(self.links.iter().map(|l| &l.link));
        for path in paths {
            if path.is_absolute() {
                return Err(DomainError::InvalidOutputPath {
                    path: path.display().to_string(),
                    reason: "generated paths must be relative to the project".into(),
                });
            }
            if !seen.insert(path) {
                return Err(DomainError::InvalidOutputPath {
                    path: path.display().to_string(),
                    reason: "generated twice".into(),
                });
            }
        }
        Ok(())
    }

    pub fn files(&self) -> impl Iterator<Item = &FileToWrite> {
        self.entries.iter()
    }

    pub fn files_in(&self, area: FileArea) -> impl Iterator<Item = &FileToWrite> {
        self.entries.iter().filter(move |f| f.area == area)
    }

    pub fn links(&self) -> impl Iterator<Item = &LinkToCreate> {
        self.links.iter()
    }

    pub fn find(&self, path: impl AsRef<Path>) -> Option<&FileToWrite> {
        let path = path.as_ref();
        self.entries.iter().find(|f| f.path == path)
    }

    pub fn file_count(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone)]
pub struct FileToWrite {
    pub area: FileArea,
    pub path: PathBuf,
    pub content: String,
}

/// A symbolic link from the fake install tree to a generated header.
#[derive(Debug, Clone)]
pub struct LinkToCreate {
    pub link: PathBuf,
    pub target: PathBuf,
}
