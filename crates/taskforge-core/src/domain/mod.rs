//! The model: types and typekits, task contexts, projects and the records
//! a task produces for generation.
//!
//! Synchronous and free of I/O. Parsing descriptors, rendering and writing
//! files all happen behind the application ports. Declared tasks are frozen
//! and shared as `Arc<TaskContext>`.

pub mod entities;
pub mod error;
pub mod value_objects;

mod validation;

pub use entities::{
    Argument, Attribute, CodeSlot, DeclarationScope, Field, FileArea, FileToWrite,
    GeneratedFiles, GeneratedMember, GeneratedMethod, Generatable, GenerationHandler,
    GenerationRecords, LinkToCreate, NumericCategory, OpaqueDefinition, OpaqueEntry,
    Operation, OperationBuilder, PackageInfo, Port, ProjectModel, ProjectView, Property, RenderContext,
    Segment, Superclass, TaskBuilder, TaskContext, TaskExtension, TaskLibrary, TemplateId, TypeCategory,
    TypeDef, TypeRef, TypeRegistry, Typekit, TypekitDescriptor, Typelist,
    decl::{
        ArgumentDecl, CodeDecl, DynamicPortDecl, OperationDecl, PortDecl, ProjectDecl, TaskDecl,
        ValueDecl,
    },
    task::FRAMEWORK_BASE_CLASS,
    typekit::{RTT_INTERFACE_TYPES, RTT_TYPEKIT_NAME},
};

pub use error::{DomainError, ErrorCategory};

pub use value_objects::{CodePlacement, Hook, PortDirection, RetentionPolicy, ThreadFlag, TypeName};

pub use validation::{DomainValidator, NATIVE_NUMERIC_TYPES};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    // ========================================================================
    // Cross-entity Tests
    // ========================================================================

    struct Scope<'a> {
        view: ProjectView<'a>,
    }

    impl DeclarationScope for Scope<'_> {
        fn project_name(&self) -> &str {
            self.view.local().name()
        }

        fn is_import(&self) -> bool {
            self.view.is_import()
        }

        fn resolve_type(&mut self, name: &str) -> Result<TypeDef, DomainError> {
            self.view
                .resolution()
                .find_type(&TypeName::parse(name)?)
                .cloned()
        }

        fn define_type(&mut self, def: TypeDef) -> Result<(), DomainError> {
            self.view.resolution_mut().define_type(def)
        }

        fn find_task_context(&self, name: &str) -> Result<Arc<TaskContext>, DomainError> {
            self.view.find_task_context(name)
        }
    }

    #[test]
    fn imported_tasks_are_external_and_visible_to_main() {
        let mut main = ProjectModel::new("main");
        let mut lib = ProjectModel::new("lib");
        {
            let mut scope = Scope {
                view: ProjectView::Delegating {
                    local: &mut lib,
                    main: &mut main,
                },
            };
            let mut builder = TaskBuilder::new(&mut scope, "Base").unwrap();
            builder.output_port("out", "/double").unwrap();
            let task = builder.build();
            assert!(task.is_external());
            scope.view.local_mut().add_task(task).unwrap();
        }
        main.using_task_library(Arc::new(TaskLibrary::from_project(lib, None)));

        let mut scope = Scope {
            view: ProjectView::Owning(&mut main),
        };
        let mut builder = TaskBuilder::new(&mut scope, "Child").unwrap();
        builder.subclasses("lib::Base").unwrap();
        let err = builder.input_port("out", "/double").unwrap_err();
        assert!(matches!(err, DomainError::DuplicateMember { .. }));
        let child = builder.build();
        assert!(!child.is_external());
        assert_eq!(child.header_file(), "main/Child.hpp");
        assert_eq!(child.ancestors().count(), 1);
    }

    #[test]
    fn property_types_follow_toplevel_rules() {
        let mut project = ProjectModel::new("demo");
        project
            .define_type(TypeDef::new(
                TypeName::new("/double[3]"),
                TypeCategory::Array {
                    element: TypeName::new("/double"),
                    length: 3,
                },
            ))
            .unwrap();
        project
            .define_type(TypeDef::compound("/demo/Vector", &[("data", "/double[3]")]))
            .unwrap();

        let mut scope = Scope {
            view: ProjectView::Owning(&mut project),
        };
        let mut builder = TaskBuilder::new(&mut scope, "Task").unwrap();
        assert!(matches!(
            builder.property("raw", "/double[3]"),
            Err(DomainError::IllegalType { .. })
        ));
        assert!(builder.property("wrapped", "/demo/Vector").is_ok());
    }
}
