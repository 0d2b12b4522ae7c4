//! Failures while finding, reading and writing things on behalf of the
//! model. Broken model rules are [`crate::domain::DomainError`].

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// No typekit of that name could be found by the typekit source.
    #[error("typekit '{name}' not found")]
    TypekitNotFound { name: String },

    /// No task library of that name could be found.
    #[error("task library '{name}' not found")]
    TaskLibraryNotFound { name: String },

    /// A task library imports itself, directly or not.
    #[error("task library import cycle: {chain}")]
    ImportCycle { chain: String },

    /// Package discovery failed.
    #[error("package '{name}' not found")]
    PackageNotFound { name: String },

    /// A type descriptor document could not be parsed.
    #[error("cannot parse type descriptor of '{source_name}': {reason}")]
    DescriptorParse { source_name: String, reason: String },

    /// A project file could not be parsed.
    #[error("cannot parse project file {path}: {reason}")]
    ProjectParse { path: PathBuf, reason: String },

    /// Template lookup failed.
    #[error("template '{name}' not found")]
    TemplateNotFound { name: String },

    /// Template rendering failed.
    #[error("Template rendering failed: {reason}")]
    RenderingFailed { reason: String },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// Shared state lock could not be taken.
    #[error("Store lock error")]
    StoreLockError,
}

impl ApplicationError {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::TypekitNotFound { name } => vec![
                format!("No '{}.tlb' / '{}.typelist' pair in the typekit search path", name, name),
                "Add the directory to search.typekit_paths in the configuration".into(),
                "Try: taskforge list typekits".into(),
            ],
            Self::TaskLibraryNotFound { name } => vec![
                format!("No '{}.orogen.toml' in the task library search path", name),
                "Add the directory to search.task_library_paths".into(),
            ],
            Self::ImportCycle { .. } => vec![
                "Remove one of the using_task_library entries along the cycle".into(),
            ],
            Self::PackageNotFound { name } => vec![
                format!("No '{}.toml' package manifest in search.package_paths", name),
            ],
            Self::DescriptorParse { .. } => vec![
                "The .tlb file is not a valid type descriptor".into(),
                "Regenerate the typekit that produced it".into(),
            ],
            Self::ProjectParse { path, .. } => vec![
                format!("Check the syntax of {}", path.display()),
                "Legacy 'method' and 'command' entries must become 'operation'".into(),
            ],
            Self::TemplateNotFound { name } => vec![
                format!("Template '{}' is neither built in nor in generation.template_dir", name),
            ],
            Self::FilesystemError { path, .. } => vec![format!(
                "Check that {} is writable and its directory exists",
                path.display()
            )],
            Self::StoreLockError => vec![
                "A shared lock was poisoned by a panicking thread".into(),
                "Try again".into(),
            ],
            Self::RenderingFailed { .. } => Vec::new(),
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TypekitNotFound { .. }
            | Self::TaskLibraryNotFound { .. }
            | Self::PackageNotFound { .. }
            | Self::TemplateNotFound { .. } => ErrorCategory::NotFound,
            Self::DescriptorParse { .. } | Self::ProjectParse { .. } | Self::ImportCycle { .. } => {
                ErrorCategory::Validation
            }
            Self::FilesystemError { .. } | Self::StoreLockError | Self::RenderingFailed { .. } => {
                ErrorCategory::Internal
            }
        }
    }
}
