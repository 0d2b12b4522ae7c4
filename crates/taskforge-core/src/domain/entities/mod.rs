pub mod codegen;
pub mod decl;
pub mod generated_files;
pub mod members;
pub mod project;
pub mod task;
pub mod template;
pub mod typekit;
pub mod types;

pub use crate::domain::DomainError;
pub use codegen::{
    CodeSlot, GeneratedMember, GeneratedMethod, Generatable, GenerationHandler, GenerationRecords,
    TaskExtension,
};
pub use generated_files::{FileArea, FileToWrite, GeneratedFiles, LinkToCreate};
pub use members::{Argument, Attribute, Operation, Port, Property, TypeRef};
pub use project::{ProjectModel, ProjectView, TaskLibrary};
pub use task::{DeclarationScope, OperationBuilder, Superclass, TaskBuilder, TaskContext};
pub use template::{RenderContext, Segment, TemplateId};
pub use typekit::{
    OpaqueDefinition, OpaqueEntry, PackageInfo, Typekit, TypekitDescriptor, Typelist,
};
pub use types::{Field, NumericCategory, TypeCategory, TypeDef, TypeRegistry};
