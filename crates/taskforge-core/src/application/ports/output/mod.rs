//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `taskforge-adapters` crate provides implementations.

use std::path::Path;

#[cfg(test)]
use mockall::automock;

use crate::domain::{PackageInfo, ProjectDecl, RenderContext, TemplateId, TypekitDescriptor};
use crate::error::ForgeResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `taskforge_adapters::filesystem::LocalFilesystem` (production)
/// - `taskforge_adapters::filesystem::MemoryFilesystem` (testing)
#[cfg_attr(test, automock)]
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> ForgeResult<()>;

    /// Write content to a file, replacing it.
    fn write_file(&self, path: &Path, content: &str) -> ForgeResult<()>;

    fn read_file(&self, path: &Path) -> ForgeResult<String>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Point `link` at `target`, replacing an existing link.
    fn symlink(&self, target: &Path, link: &Path) -> ForgeResult<()>;
}

/// Port for template rendering.
///
/// Implemented by:
/// - `taskforge_adapters::renderer::BuiltinRenderer` (built-in C++ templates,
///   optionally overridden from a directory)
#[cfg_attr(test, automock)]
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: TemplateId, context: &RenderContext) -> ForgeResult<String>;
}

/// Unparsed typekit files, as found by a [`TypekitSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTypekit {
    pub name: String,
    /// Package providing the typekit's headers and libraries.
    pub package: Option<String>,
    /// Type descriptor document.
    pub descriptor: String,
    pub typelist: String,
}

/// Port for typekit discovery.
#[cfg_attr(test, automock)]
pub trait TypekitSource: Send + Sync {
    /// `None` when no typekit of that name exists.
    fn load(&self, name: &str) -> ForgeResult<Option<RawTypekit>>;

    fn available(&self) -> ForgeResult<Vec<String>>;
}

/// Port for reading type descriptor documents.
#[cfg_attr(test, automock)]
pub trait DescriptorParser: Send + Sync {
    fn parse(&self, source_name: &str, document: &str) -> ForgeResult<TypekitDescriptor>;
}

/// Port for package discovery.
#[cfg_attr(test, automock)]
pub trait PackageResolver: Send + Sync {
    fn resolve(&self, package: &str) -> ForgeResult<PackageInfo>;
}

/// Port for finding task libraries to import.
#[cfg_attr(test, automock)]
pub trait TaskLibrarySource: Send + Sync {
    /// `None` when no task library of that name exists.
    fn load(&self, name: &str) -> ForgeResult<Option<ProjectDecl>>;

    fn available(&self) -> ForgeResult<Vec<String>>;
}
