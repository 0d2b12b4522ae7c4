//! Domain and application layers of taskforge.
//!
//! taskforge turns declarative component interfaces (ports, properties,
//! operations, states) into a base class that is regenerated on every run
//! and a user class that is written once and then left alone.
//!
//! ```text
//!  taskforge-cli
//!      │ drives
//!      ▼
//!  application::services   ProjectLoader, TypekitImporter,
//!      │                   DependencyResolver, GenerationService
//!      │ through
//!      ▼
//!  application::ports      TypekitSource, DescriptorParser, PackageResolver,
//!      ▲                   TaskLibrarySource, TemplateRenderer, Filesystem
//!      │ implemented by
//!  taskforge-adapters
//!
//!  domain                  TypeRegistry, Typekit, TaskContext,
//!                          ProjectModel, GenerationRecords
//! ```
//!
//! Nothing in this crate touches the disk; every file and directory access
//! goes through a port.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taskforge_core::application::{
//!     GenerationOptions, GenerationService, ProjectLoader, TypekitImporter,
//! };
//!
//! let importer = Arc::new(TypekitImporter::new(source, parser, packages));
//! let project = ProjectLoader::new(importer, libraries).load(&decl)?;
//!
//! let service = GenerationService::new(renderer, filesystem, GenerationOptions::default());
//! let report = service.generate(&project, "./my_project".as_ref())?;
//! ```

pub mod application;
pub mod domain;
pub mod error;
