//! Application layer for taskforge.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (ProjectLoader, GenerationService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! model rules itself. Those live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

pub use services::{
    DependencyResolver, FilePreservationPolicy, GenerationOptions, GenerationReport,
    GenerationService, ProjectLoader, Resolution, SaveOutcome, TaskDependencies, TaskGenerator,
    TaskReport, TypekitImporter,
};

pub use ports::{
    DescriptorParser, Filesystem, PackageResolver, RawTypekit, TaskLibrarySource,
    TemplateRenderer, TypekitSource,
};

pub use error::ApplicationError;
