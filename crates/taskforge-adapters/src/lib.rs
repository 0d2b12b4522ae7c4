//! Disk, XML and template implementations of the
//! `taskforge_core::application::ports` traits.

pub mod descriptor;
pub mod discovery;
pub mod filesystem;
pub mod project_file;
pub mod renderer;

pub use descriptor::XmlDescriptorParser;
pub use discovery::{DirectoryTaskLibrarySource, DirectoryTypekitSource, ManifestPackageResolver};
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use project_file::read_project;
pub use renderer::BuiltinRenderer;
