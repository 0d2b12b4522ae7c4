//! Projects, imported task libraries and the view used to declare into them.

use std::sync::Arc;

use crate::domain::{
    entities::{
        task::TaskContext,
        typekit::{OpaqueDefinition, PackageInfo, Typekit},
        types::{TypeDef, TypeRegistry},
    },
    error::DomainError,
    value_objects::TypeName,
};

/// Task contexts defined by another project and imported by name.
#[derive(Debug, Clone)]
pub struct TaskLibrary {
    pub name: String,
    pub package: Option<PackageInfo>,
    tasks: Vec<Arc<TaskContext>>,
}

impl TaskLibrary {
    /// Wrap the tasks of a loaded import.
    pub fn from_project(model: ProjectModel, package: Option<PackageInfo>) -> Self {
        Self {
            name: model.name,
            package,
            tasks: model.tasks,
        }
    }

    /// Tasks defined by the library itself.
    pub fn self_tasks(&self) -> &[Arc<TaskContext>] {
        &self.tasks
    }

    pub fn find_task(&self, name: &str) -> Option<Arc<TaskContext>> {
        self.tasks
            .iter()
            .find(|t| t.name() == name || t.basename() == name)
            .cloned()
    }
}

/// Everything one project knows: its own typekit, its imports and the
/// tasks it declares.
///
/// Mutated only during the load phase.
#[derive(Debug, Clone)]
pub struct ProjectModel {
    name: String,
    typekit: Option<Arc<Typekit>>,
    used_typekits: Vec<Arc<Typekit>>,
    used_task_libraries: Vec<Arc<TaskLibrary>>,
    tasks: Vec<Arc<TaskContext>>,
    registry: TypeRegistry,
}

impl ProjectModel {
    /// A project with the framework's typekit imported.
    pub fn new(name: impl Into<String>) -> Self {
        let registry = TypeRegistry::with_standard_types();
        let rtt = Arc::new(Typekit::virtual_rtt(&registry));
        Self {
            name: name.into(),
            typekit: None,
            used_typekits: vec![rtt],
            used_task_libraries: Vec::new(),
            tasks: Vec::new(),
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The project's own typekit.
    pub fn typekit(&self) -> Option<&Arc<Typekit>> {
        self.typekit.as_ref()
    }

    pub fn used_typekits(&self) -> &[Arc<Typekit>] {
        &self.used_typekits
    }

    pub fn used_task_libraries(&self) -> &[Arc<TaskLibrary>] {
        &self.used_task_libraries
    }

    /// Every task declared by this project.
    pub fn tasks(&self) -> &[Arc<TaskContext>] {
        &self.tasks
    }

    /// Declared tasks that are defined here, i.e. can be generated.
    pub fn self_tasks(&self) -> impl Iterator<Item = &Arc<TaskContext>> {
        self.tasks.iter().filter(|t| !t.is_external())
    }

    /// Use `typekit` as the project's own typekit.
    pub fn set_typekit(&mut self, typekit: Arc<Typekit>) -> Result<(), DomainError> {
        self.registry.merge(typekit.registry())?;
        self.typekit = Some(typekit);
        Ok(())
    }

    /// Import a typekit. Importing the same typekit twice is a no-op.
    pub fn using_typekit(&mut self, typekit: Arc<Typekit>) -> Result<(), DomainError> {
        if self.has_typekit(typekit.name()) {
            return Ok(());
        }
        self.registry.merge(typekit.registry())?;
        self.used_typekits.push(typekit);
        Ok(())
    }

    pub fn using_task_library(&mut self, library: Arc<TaskLibrary>) {
        if !self.used_task_libraries.iter().any(|l| l.name == library.name) {
            self.used_task_libraries.push(library);
        }
    }

    pub fn has_typekit(&self, name: &str) -> bool {
        self.find_typekit(name).is_some()
    }

    pub fn find_typekit(&self, name: &str) -> Option<&Arc<Typekit>> {
        self.typekit
            .iter()
            .chain(&self.used_typekits)
            .find(|tk| tk.name() == name)
    }

    pub fn has_task_library(&self, name: &str) -> bool {
        self.used_task_libraries.iter().any(|l| l.name == name)
    }

    pub fn find_type(&self, name: &TypeName) -> Result<&TypeDef, DomainError> {
        self.registry.get(name)
    }

    /// Register a type created on behalf of this project.
    pub fn define_type(&mut self, def: TypeDef) -> Result<(), DomainError> {
        self.registry.add(def)
    }

    /// True if some loaded typekit exports `name` as an interface type.
    pub fn interface_type(&self, name: &TypeName) -> bool {
        self.typekit
            .iter()
            .chain(&self.used_typekits)
            .any(|tk| tk.interface_type(name))
    }

    pub fn opaque_for(&self, name: &TypeName) -> Option<&OpaqueDefinition> {
        self.typekit
            .iter()
            .chain(&self.used_typekits)
            .find_map(|tk| tk.opaque_for(name))
    }

    pub fn add_task(&mut self, task: TaskContext) -> Result<Arc<TaskContext>, DomainError> {
        if self.find_local_task(task.name()).is_some() {
            return Err(DomainError::DuplicateTask {
                name: task.name().to_string(),
            });
        }
        let task = Arc::new(task);
        self.tasks.push(Arc::clone(&task));
        Ok(task)
    }

    /// Look a task up by full name, or by basename within this project.
    pub fn find_local_task(&self, name: &str) -> Option<Arc<TaskContext>> {
        let qualified = if name.contains("::") {
            name.to_string()
        } else {
            format!("{}::{}", self.name, name)
        };
        self.tasks.iter().find(|t| t.name() == qualified).cloned()
    }

    /// Local tasks first, then imported task libraries.
    pub fn find_task_context(&self, name: &str) -> Result<Arc<TaskContext>, DomainError> {
        self.find_local_task(name)
            .or_else(|| {
                self.used_task_libraries
                    .iter()
                    .find_map(|lib| lib.tasks.iter().find(|t| t.name() == name).cloned())
            })
            .ok_or_else(|| DomainError::TaskNotFound {
                name: name.to_string(),
            })
    }
}

/// The project a declaration is evaluated against.
///
/// An imported project keeps its own tasks but shares types, typekits and
/// task libraries with the main project, so a dependency imported twice
/// along a diamond is only loaded once.
pub enum ProjectView<'a> {
    Owning(&'a mut ProjectModel),
    Delegating {
        local: &'a mut ProjectModel,
        main: &'a mut ProjectModel,
    },
}

impl ProjectView<'_> {
    /// Where type, typekit and task-library queries go.
    pub fn resolution(&self) -> &ProjectModel {
        match self {
            Self::Owning(project) => project,
            Self::Delegating { main, .. } => main,
        }
    }

    pub fn resolution_mut(&mut self) -> &mut ProjectModel {
        match self {
            Self::Owning(project) => project,
            Self::Delegating { main, .. } => main,
        }
    }

    /// Where declared tasks are stored.
    pub fn local(&self) -> &ProjectModel {
        match self {
            Self::Owning(project) => project,
            Self::Delegating { local, .. } => local,
        }
    }

    pub fn local_mut(&mut self) -> &mut ProjectModel {
        match self {
            Self::Owning(project) => project,
            Self::Delegating { local, .. } => local,
        }
    }

    pub fn is_import(&self) -> bool {
        matches!(self, Self::Delegating { .. })
    }

    /// Local tasks first, then whatever the resolution project can see.
    pub fn find_task_context(&self, name: &str) -> Result<Arc<TaskContext>, DomainError> {
        match self.local().find_task_context(name) {
            Ok(task) => Ok(task),
            Err(err) if self.is_import() => self.resolution().find_task_context(name).map_err(|_| err),
            Err(err) => Err(err),
        }
    }
}
