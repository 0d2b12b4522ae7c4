//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "load a project" or "generate its tasks".

pub mod dependency_resolver;
pub mod generation_service;
pub mod preservation;
pub mod project_loader;
pub mod task_generator;
pub mod typekit_importer;

pub use dependency_resolver::{DependencyResolver, TaskDependencies};
pub use generation_service::{GenerationReport, GenerationService, TaskReport};
pub use preservation::{FilePreservationPolicy, SaveOutcome};
pub use project_loader::ProjectLoader;
pub use task_generator::{GenerationOptions, TaskGenerator};
pub use typekit_importer::{Resolution, TypekitImporter};
