//! Load phase: turn project declarations into a [`ProjectModel`].
//!
//! Imported task libraries are declared through a delegating view, so their
//! types and typekits land in the main project and a library reached along
//! two import paths is loaded once.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::{
    application::{ApplicationError, ports::TaskLibrarySource, services::TypekitImporter},
    domain::{
        CodePlacement, DeclarationScope, DomainError, PortDirection, ProjectDecl, ProjectModel,
        ProjectView, TaskBuilder, TaskContext, TaskDecl, TaskLibrary, TypeDef, TypeName,
    },
    error::{ForgeError, ForgeResult},
};

pub struct ProjectLoader {
    importer: Arc<TypekitImporter>,
    libraries: Box<dyn TaskLibrarySource>,
}

impl ProjectLoader {
    pub fn new(importer: Arc<TypekitImporter>, libraries: Box<dyn TaskLibrarySource>) -> Self {
        Self {
            importer,
            libraries,
        }
    }

    pub fn importer(&self) -> &TypekitImporter {
        &self.importer
    }

    /// Build the main project described by `decl`.
    #[instrument(skip_all, fields(project = %decl.name))]
    pub fn load(&self, decl: &ProjectDecl) -> ForgeResult<ProjectModel> {
        let mut project = ProjectModel::new(&decl.name);
        let mut loading = vec![decl.name.clone()];
        self.apply(&mut ProjectView::Owning(&mut project), decl, &mut loading)?;
        info!(
            tasks = project.tasks().len(),
            typekits = project.used_typekits().len(),
            task_libraries = project.used_task_libraries().len(),
            "Project loaded"
        );
        Ok(project)
    }

    /// Declare one more task on `project` programmatically.
    ///
    /// This is how extensions and generation handlers get attached, since
    /// project files cannot express them.
    pub fn declare_with<F>(
        &self,
        project: &mut ProjectModel,
        name: &str,
        declare: F,
    ) -> ForgeResult<Arc<TaskContext>>
    where
        F: FnOnce(&mut TaskBuilder<'_>) -> Result<(), DomainError>,
    {
        let mut view = ProjectView::Owning(project);
        let mut scope = LoaderScope::new(&mut view, &self.importer);
        let task = TaskBuilder::new(&mut scope, name)
            .and_then(|mut builder| {
                declare(&mut builder)?;
                Ok(builder.build())
            })
            .map_err(|err| scope.surface(err))?;
        Ok(scope.view.local_mut().add_task(task)?)
    }

    fn apply(
        &self,
        view: &mut ProjectView<'_>,
        decl: &ProjectDecl,
        loading: &mut Vec<String>,
    ) -> ForgeResult<()> {
        if let Some(name) = &decl.typekit {
            let typekit = self.importer.require(name)?;
            if view.is_import() {
                view.resolution_mut().using_typekit(typekit)?;
            } else {
                view.local_mut().set_typekit(typekit)?;
            }
        }

        for name in &decl.using_typekit {
            if view.resolution().has_typekit(name) {
                continue;
            }
            let typekit = self.importer.require(name)?;
            view.resolution_mut().using_typekit(typekit)?;
        }

        for name in &decl.using_task_library {
            self.import_task_library(view, name, loading)?;
        }

        for task in &decl.tasks {
            self.declare_task(view, task)?;
        }
        Ok(())
    }

    #[instrument(skip(self, view, loading))]
    fn import_task_library(
        &self,
        view: &mut ProjectView<'_>,
        name: &str,
        loading: &mut Vec<String>,
    ) -> ForgeResult<()> {
        if view.resolution().has_task_library(name) {
            return Ok(());
        }
        if loading.iter().any(|n| n == name) {
            return Err(ApplicationError::ImportCycle {
                chain: format!("{} -> {}", loading.join(" -> "), name),
            }
            .into());
        }
        let decl = self
            .libraries
            .load(name)?
            .ok_or_else(|| ApplicationError::TaskLibraryNotFound {
                name: name.to_string(),
            })?;

        let mut library = ProjectModel::new(&decl.name);
        loading.push(name.to_string());
        let result = {
            let mut import = ProjectView::Delegating {
                local: &mut library,
                main: view.resolution_mut(),
            };
            self.apply(&mut import, &decl, loading)
        };
        loading.pop();
        result?;

        info!(tasks = library.tasks().len(), "Task library imported");
        view.resolution_mut()
            .using_task_library(Arc::new(TaskLibrary::from_project(library, None)));
        Ok(())
    }

    fn declare_task(
        &self,
        view: &mut ProjectView<'_>,
        decl: &TaskDecl,
    ) -> ForgeResult<Arc<TaskContext>> {
        let mut scope = LoaderScope::new(view, &self.importer);
        let task = build_task(&mut scope, decl).map_err(|err| scope.surface(err))?;
        let task = scope.view.local_mut().add_task(task)?;
        debug!(task = task.name(), external = task.is_external(), "Task declared");
        Ok(task)
    }
}

/// Apply one task declaration through the builder.
fn build_task(scope: &mut dyn DeclarationScope, decl: &TaskDecl) -> Result<TaskContext, DomainError> {
    let mut builder = TaskBuilder::new(scope, &decl.name)?;

    if let Some(parent) = &decl.subclasses {
        builder.subclasses(parent)?;
    }
    if let Some(doc) = &decl.doc {
        builder.doc(doc.as_str());
    }
    if decl.needs_configuration {
        builder.needs_configuration();
    }
    if decl.fixed_initial_state {
        builder.fixed_initial_state();
    }

    for legacy in &decl.methods {
        builder.method(&legacy.name)?;
    }
    for legacy in &decl.commands {
        builder.command(&legacy.name)?;
    }

    for p in &decl.input_ports {
        let port = builder.input_port(&p.name, &p.type_name)?;
        port.doc = p.doc.clone();
        port.event_triggered = p.event;
        port.clear_on_start = p.clear_on_start;
    }
    for p in &decl.output_ports {
        let port = builder.output_port(&p.name, &p.type_name)?;
        port.doc = p.doc.clone();
        port.retention = p.keep_last_written_value;
    }
    let dynamic = decl
        .dynamic_input_ports
        .iter()
        .map(|p| (p, PortDirection::Input))
        .chain(
            decl.dynamic_output_ports
                .iter()
                .map(|p| (p, PortDirection::Output)),
        );
    for (p, direction) in dynamic {
        builder
            .dynamic_port(&p.name, direction, p.type_name.as_deref())?
            .doc = p.doc.clone();
    }

    for v in &decl.properties {
        let property = builder.property(&v.name, &v.type_name)?;
        property.doc = v.doc.clone();
        property.default_value = v.default.clone();
    }
    for v in &decl.attributes {
        let attribute = builder.attribute(&v.name, &v.type_name)?;
        attribute.doc = v.doc.clone();
        attribute.default_value = v.default.clone();
    }

    for o in &decl.operations {
        let mut op = builder.operation(&o.name)?;
        for arg in &o.arguments {
            op.argument(&arg.name, &arg.type_name, &arg.doc)?;
        }
        if let Some(ret) = &o.returns {
            op.returns(ret)?;
        }
        if let Some(doc) = &o.doc {
            op.doc(doc.as_str());
        }
        if o.caller_thread {
            op.runs_in_caller_thread();
        }
        if let Some(method) = &o.method_name {
            op.method_name(method.as_str());
        }
        if let Some(body) = &o.body {
            op.body(body.as_str());
        }
        if o.hidden {
            op.hidden();
        }
    }

    for (hook, statements) in &decl.hooks {
        for code in statements {
            builder.in_base_hook(hook, code.as_str())?;
        }
    }
    for code in &decl.header_code {
        builder.add_base_header_code(code.code.as_str(), placement(code.after_class));
    }
    for code in &decl.implementation_code {
        builder.add_base_implementation_code(code.code.as_str(), placement(code.after_class));
    }

    Ok(builder.build())
}

fn placement(after_class: bool) -> CodePlacement {
    if after_class {
        CodePlacement::AfterClass
    } else {
        CodePlacement::BeforeClass
    }
}

// ── LoaderScope ──────────────────────────────────────────────────────────────

/// Declaration scope backed by a project view and the shared importer.
///
/// A type miss imports, in order, the typekit named after the declaring
/// project and the typekit named after the type's leading namespace, then
/// retries the lookup.
struct LoaderScope<'v, 'p> {
    view: &'v mut ProjectView<'p>,
    importer: &'v TypekitImporter,
    attempted: HashSet<String>,
    import_failure: Option<ForgeError>,
}

impl<'v, 'p> LoaderScope<'v, 'p> {
    fn new(view: &'v mut ProjectView<'p>, importer: &'v TypekitImporter) -> Self {
        Self {
            view,
            importer,
            attempted: HashSet::new(),
            import_failure: None,
        }
    }

    /// The error to report for a failed declaration: an import failure
    /// hidden behind a type miss wins.
    fn surface(&mut self, err: DomainError) -> ForgeError {
        self.import_failure.take().unwrap_or_else(|| err.into())
    }

    fn import_candidates(&self, name: &TypeName) -> Vec<String> {
        let project = self.view.local().name().to_string();
        let namespace = name
            .namespace()
            .trim_matches('/')
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string();

        let mut candidates = Vec::new();
        for candidate in [project, namespace] {
            if candidate.is_empty()
                || candidates.contains(&candidate)
                || self.attempted.contains(&candidate)
                || self.view.resolution().has_typekit(&candidate)
            {
                continue;
            }
            candidates.push(candidate);
        }
        candidates
    }
}

impl DeclarationScope for LoaderScope<'_, '_> {
    fn project_name(&self) -> &str {
        self.view.local().name()
    }

    fn is_import(&self) -> bool {
        self.view.is_import()
    }

    fn resolve_type(&mut self, name: &str) -> Result<TypeDef, DomainError> {
        let type_name = TypeName::parse(name)?;
        let miss = match self.view.resolution().find_type(&type_name) {
            Ok(def) => return Ok(def.clone()),
            Err(err) if err.is_type_miss() => err,
            Err(err) => return Err(err),
        };

        for candidate in self.import_candidates(&type_name) {
            self.attempted.insert(candidate.clone());
            let typekit = match self.importer.import(&candidate) {
                Ok(Some(typekit)) => typekit,
                Ok(None) => continue,
                Err(err) => {
                    self.import_failure = Some(err);
                    return Err(miss);
                }
            };
            debug!(typekit = %candidate, type_name = %type_name, "Imported typekit on type miss");
            self.view.resolution_mut().using_typekit(typekit)?;
            if let Ok(def) = self.view.resolution().find_type(&type_name) {
                return Ok(def.clone());
            }
        }
        Err(miss)
    }

    fn define_type(&mut self, def: TypeDef) -> Result<(), DomainError> {
        self.view.resolution_mut().define_type(def)
    }

    fn find_task_context(&self, name: &str) -> Result<Arc<TaskContext>, DomainError> {
        self.view.find_task_context(name)
    }
}
