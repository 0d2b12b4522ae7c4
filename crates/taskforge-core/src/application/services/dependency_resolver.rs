//! Which typekits and task libraries a task needs to compile.

use std::sync::Arc;

use crate::domain::{ProjectModel, TaskContext, TaskLibrary, Typekit};

/// What a task's generated code depends on.
#[derive(Debug, Clone, Default)]
pub struct TaskDependencies {
    pub typekits: Vec<Arc<Typekit>>,
    pub task_libraries: Vec<Arc<TaskLibrary>>,
}

impl TaskDependencies {
    pub fn typekit_names(&self) -> Vec<&str> {
        self.typekits.iter().map(|tk| tk.name()).collect()
    }

    pub fn task_library_names(&self) -> Vec<&str> {
        self.task_libraries.iter().map(|l| l.name.as_str()).collect()
    }
}

pub struct DependencyResolver;

impl DependencyResolver {
    pub fn resolve(project: &ProjectModel, task: &TaskContext) -> TaskDependencies {
        TaskDependencies {
            typekits: Self::required_typekits(project, task),
            task_libraries: Self::required_task_libraries(project, task),
        }
    }

    /// Typekits exporting at least one type of the task's interface.
    ///
    /// Inherited members, dynamic port templates and operation signatures
    /// all count.
    pub fn required_typekits(project: &ProjectModel, task: &TaskContext) -> Vec<Arc<Typekit>> {
        let types = task.interface_types();
        project
            .typekit()
            .into_iter()
            .chain(project.used_typekits())
            .filter(|tk| types.iter().any(|t| tk.includes(t)))
            .cloned()
            .collect()
    }

    /// Task libraries defining one of the task's ancestors.
    pub fn required_task_libraries(
        project: &ProjectModel,
        task: &TaskContext,
    ) -> Vec<Arc<TaskLibrary>> {
        project
            .used_task_libraries()
            .iter()
            .filter(|lib| lib.self_tasks().iter().any(|t| task.implements(t.name())))
            .cloned()
            .collect()
    }
}
