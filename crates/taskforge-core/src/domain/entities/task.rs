//! Task contexts: the component model and its declaration builder.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::{
    entities::{
        codegen::{CodeSlot, GenerationHandler, GenerationRecords, Generatable, TaskExtension},
        members::{Argument, Attribute, Operation, Port, Property, TypeRef},
        types::{TypeCategory, TypeDef},
    },
    error::DomainError,
    validation::DomainValidator,
    value_objects::{CodePlacement, Hook, PortDirection, ThreadFlag, TypeName},
};

/// Class every root task ultimately derives from.
pub const FRAMEWORK_BASE_CLASS: &str = "RTT::TaskContext";

/// Methods generated on every task class.
pub const GENERATED_METHODS: &[&str] = &["getModelName", "__orogen_getTID"];

#[derive(Debug, Clone)]
pub enum Superclass {
    /// A class not modelled here, usually [`FRAMEWORK_BASE_CLASS`].
    Framework(String),
    Task(Arc<TaskContext>),
}

impl Superclass {
    pub fn name(&self) -> &str {
        match self {
            Self::Framework(name) => name,
            Self::Task(task) => task.name(),
        }
    }

    pub fn is_framework_root(&self) -> bool {
        matches!(self, Self::Framework(name) if name == FRAMEWORK_BASE_CLASS)
    }
}

impl Default for Superclass {
    fn default() -> Self {
        Self::Framework(FRAMEWORK_BASE_CLASS.to_string())
    }
}

/// A component: typed interface plus lifecycle hooks.
///
/// Built through [`TaskBuilder`] during the load phase and frozen (shared
/// behind an `Arc`) once declared.
#[derive(Debug, Clone)]
pub struct TaskContext {
    name: String,
    project: String,
    superclass: Superclass,
    doc: Option<String>,
    ports: Vec<Port>,
    dynamic_ports: Vec<Port>,
    properties: Vec<Property>,
    attributes: Vec<Attribute>,
    operations: Vec<Operation>,
    needs_configuration: bool,
    fixed_initial_state: bool,
    external_definition: bool,
    declared: GenerationRecords,
    extensions: Vec<Arc<dyn TaskExtension>>,
    generation_handlers: Vec<GenerationHandler>,
}

impl TaskContext {
    /// Fully qualified name, `project::Basename`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_name(&self) -> &str {
        &self.project
    }

    /// Name without the project prefix.
    pub fn basename(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }

    pub fn superclass(&self) -> &Superclass {
        &self.superclass
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn dynamic_ports(&self) -> &[Port] {
        &self.dynamic_ports
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn extensions(&self) -> &[Arc<dyn TaskExtension>] {
        &self.extensions
    }

    pub fn generation_handlers(&self) -> &[GenerationHandler] {
        &self.generation_handlers
    }

    /// Records declared explicitly (hooks, toplevel code, extra methods).
    pub fn declared_records(&self) -> &GenerationRecords {
        &self.declared
    }

    /// True for tasks imported from a task library.
    pub fn is_external(&self) -> bool {
        self.external_definition
    }

    /// Superclass chain, nearest first, excluding `self`.
    pub fn ancestors(&self) -> impl Iterator<Item = &TaskContext> {
        let mut current = match &self.superclass {
            Superclass::Task(parent) => Some(parent.as_ref()),
            Superclass::Framework(_) => None,
        };
        std::iter::from_fn(move || {
            let task = current?;
            current = match &task.superclass {
                Superclass::Task(parent) => Some(parent.as_ref()),
                Superclass::Framework(_) => None,
            };
            Some(task)
        })
    }

    /// `self` followed by its ancestors.
    pub fn chain(&self) -> impl Iterator<Item = &TaskContext> {
        std::iter::once(self).chain(self.ancestors())
    }

    /// True if this task is, or derives from, the task called `name`.
    pub fn implements(&self, name: &str) -> bool {
        self.chain().any(|t| t.name == name)
            || self.chain().any(|t| matches!(&t.superclass, Superclass::Framework(f) if f == name))
    }

    pub fn needs_configuration(&self) -> bool {
        self.chain().any(|t| t.needs_configuration)
    }

    /// The initial state cannot be chosen by the user.
    pub fn fixed_initial_state(&self) -> bool {
        self.chain()
            .any(|t| t.fixed_initial_state || t.needs_configuration)
    }

    /// Member names declared here and in every ancestor.
    pub fn all_member_names(&self) -> BTreeSet<&str> {
        self.chain().flat_map(TaskContext::own_member_names).collect()
    }

    fn own_member_names(&self) -> impl Iterator<Item = &str> {
        self.ports
            .iter()
            .chain(&self.dynamic_ports)
            .map(|p| p.name.as_str())
            .chain(self.properties.iter().map(|p| p.name.as_str()))
            .chain(self.attributes.iter().map(|a| a.name.as_str()))
            .chain(self.operations.iter().map(|o| o.name.as_str()))
    }

    /// Name of the task declaring `member`, searching up the chain.
    pub fn owner_of(&self, member: &str) -> Option<&str> {
        self.chain()
            .find(|t| t.own_member_names().any(|n| n == member))
            .map(TaskContext::name)
    }

    pub fn find_port(&self, name: &str) -> Option<&Port> {
        self.chain()
            .flat_map(|t| t.ports.iter())
            .find(|p| p.name == name)
    }

    pub fn all_ports(&self) -> Vec<&Port> {
        self.chain().flat_map(|t| t.ports.iter()).collect()
    }

    pub fn all_dynamic_ports(&self) -> Vec<&Port> {
        self.chain().flat_map(|t| t.dynamic_ports.iter()).collect()
    }

    pub fn all_properties(&self) -> Vec<&Property> {
        self.chain().flat_map(|t| t.properties.iter()).collect()
    }

    pub fn all_attributes(&self) -> Vec<&Attribute> {
        self.chain().flat_map(|t| t.attributes.iter()).collect()
    }

    pub fn all_operations(&self) -> Vec<&Operation> {
        self.chain().flat_map(|t| t.operations.iter()).collect()
    }

    /// Every type referenced by the interface, inherited members included.
    pub fn interface_types(&self) -> BTreeSet<TypeName> {
        let mut types = BTreeSet::new();
        for task in self.chain() {
            let members = task
                .ports
                .iter()
                .chain(&task.dynamic_ports)
                .flat_map(Generatable::used_types)
                .chain(task.properties.iter().flat_map(Generatable::used_types))
                .chain(task.attributes.iter().flat_map(Generatable::used_types))
                .chain(task.operations.iter().flat_map(Generatable::used_types));
            types.extend(members.cloned());
            for ext in &task.extensions {
                types.extend(ext.used_types());
            }
        }
        types
    }

    /// Base-class methods visible from a subclass of this task.
    pub fn base_method_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for task in self.chain() {
            names.extend(task.declared.method_names().map(str::to_string));
            names.extend(task.operations.iter().map(|o| o.method_name.clone()));
        }
        names
    }

    /// Header path as included by dependent projects.
    pub fn header_file(&self) -> String {
        let prefix = if self.external_definition {
            self.name.split("::").next().unwrap_or(&self.project)
        } else {
            &self.project
        };
        format!("{}/{}.hpp", prefix.to_lowercase(), self.basename())
    }

    /// Type name of the generated state enumeration.
    pub fn state_type_name(&self) -> String {
        format!("{}_STATES", self.basename())
    }

    /// C++ name of `state` at namespace scope.
    pub fn state_global_value_name(&self, state: &str) -> String {
        format!("{}_{}", self.basename(), state.to_uppercase())
    }

    /// C++ name of `state` inside the class scope.
    pub fn state_local_value_name(&self, state: &str) -> String {
        state.to_uppercase()
    }
}

// ── Declaration ──────────────────────────────────────────────────────────────

/// What a task declaration can ask of the project it is declared in.
pub trait DeclarationScope {
    fn project_name(&self) -> &str;

    /// True when declaring tasks of an imported task library.
    fn is_import(&self) -> bool;

    /// Resolve a type, importing its typekit on demand.
    fn resolve_type(&mut self, name: &str) -> Result<TypeDef, DomainError>;

    /// Register a type generated on behalf of the project's own typekit.
    fn define_type(&mut self, def: TypeDef) -> Result<(), DomainError>;

    fn find_task_context(&self, name: &str) -> Result<Arc<TaskContext>, DomainError>;
}

/// Declares one task context against a [`DeclarationScope`].
pub struct TaskBuilder<'s> {
    scope: &'s mut dyn DeclarationScope,
    task: TaskContext,
}

impl<'s> TaskBuilder<'s> {
    /// Start declaring `name`; the project prefix is added when missing.
    pub fn new(scope: &'s mut dyn DeclarationScope, name: &str) -> Result<Self, DomainError> {
        let project = scope.project_name().to_string();
        let (qualified, basename) = match name.rsplit_once("::") {
            Some((_, base)) => (name.to_string(), base),
            None => (format!("{}::{}", project, name), name),
        };
        DomainValidator::validate_identifier(basename)?;

        let task = TaskContext {
            name: qualified,
            external_definition: scope.is_import(),
            project,
            superclass: Superclass::default(),
            doc: None,
            ports: Vec::new(),
            dynamic_ports: Vec::new(),
            properties: Vec::new(),
            attributes: Vec::new(),
            operations: Vec::new(),
            needs_configuration: false,
            fixed_initial_state: false,
            declared: GenerationRecords::new(),
            extensions: Vec::new(),
            generation_handlers: Vec::new(),
        };
        Ok(Self { scope, task })
    }

    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// Derive from another task context, local or imported.
    pub fn subclasses(&mut self, name: &str) -> Result<&mut Self, DomainError> {
        let parent = self.scope.find_task_context(name)?;
        if let Some(clash) = self
            .task
            .own_member_names()
            .find(|n| parent.all_member_names().contains(n))
        {
            return Err(DomainError::DuplicateMember {
                task: self.task.name.clone(),
                name: clash.to_string(),
                owner: parent.owner_of(clash).unwrap_or(parent.name()).to_string(),
            });
        }
        self.task.superclass = Superclass::Task(parent);
        Ok(self)
    }

    pub fn doc(&mut self, text: impl Into<String>) -> &mut Self {
        self.task.doc = Some(text.into());
        self
    }

    pub fn needs_configuration(&mut self) -> &mut Self {
        self.task.needs_configuration = true;
        self
    }

    pub fn fixed_initial_state(&mut self) -> &mut Self {
        self.task.fixed_initial_state = true;
        self
    }

    fn check_uniqueness(&self, name: &str) -> Result<(), DomainError> {
        DomainValidator::validate_identifier(name)?;
        self.check_not_generated(name)?;
        match self.task.owner_of(name) {
            Some(owner) => Err(DomainError::DuplicateMember {
                task: self.task.name.clone(),
                name: name.to_string(),
                owner: owner.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Generated methods belong to the root of the chain.
    fn check_not_generated(&self, name: &str) -> Result<(), DomainError> {
        if !GENERATED_METHODS.contains(&name) {
            return Ok(());
        }
        let root = self.task.chain().last().unwrap_or(&self.task);
        Err(DomainError::DuplicateMember {
            task: self.task.name.clone(),
            name: name.to_string(),
            owner: root.superclass().name().to_string(),
        })
    }

    fn toplevel_type(&mut self, type_name: &str) -> Result<TypeRef, DomainError> {
        let def = self.scope.resolve_type(type_name)?;
        DomainValidator::validate_toplevel_type(&def)?;
        Ok(TypeRef::from(&def))
    }

    fn port(
        &mut self,
        name: &str,
        direction: PortDirection,
        type_name: &str,
    ) -> Result<&mut Port, DomainError> {
        self.check_uniqueness(name)?;
        let type_ref = self.toplevel_type(type_name)?;
        Ok(push_last(
            &mut self.task.ports,
            Port::new(name, direction, Some(type_ref)),
        ))
    }

    pub fn input_port(&mut self, name: &str, type_name: &str) -> Result<&mut Port, DomainError> {
        self.port(name, PortDirection::Input, type_name)
    }

    pub fn output_port(&mut self, name: &str, type_name: &str) -> Result<&mut Port, DomainError> {
        self.port(name, PortDirection::Output, type_name)
    }

    /// Declare a port template instantiated at deployment time.
    ///
    /// `type_name` of `None` accepts any type.
    pub fn dynamic_port(
        &mut self,
        name: &str,
        direction: PortDirection,
        type_name: Option<&str>,
    ) -> Result<&mut Port, DomainError> {
        self.check_uniqueness(name)?;
        let type_ref = type_name.map(|t| self.toplevel_type(t)).transpose()?;
        let mut port = Port::new(name, direction, type_ref);
        port.dynamic = true;
        Ok(push_last(&mut self.task.dynamic_ports, port))
    }

    pub fn property(&mut self, name: &str, type_name: &str) -> Result<&mut Property, DomainError> {
        self.check_uniqueness(name)?;
        let type_ref = self.toplevel_type(type_name)?;
        Ok(push_last(
            &mut self.task.properties,
            Property {
                name: name.to_string(),
                type_ref,
                doc: None,
                default_value: None,
            },
        ))
    }

    pub fn attribute(&mut self, name: &str, type_name: &str) -> Result<&mut Attribute, DomainError> {
        self.check_uniqueness(name)?;
        let type_ref = self.toplevel_type(type_name)?;
        Ok(push_last(
            &mut self.task.attributes,
            Attribute {
                name: name.to_string(),
                type_ref,
                doc: None,
                default_value: None,
            },
        ))
    }

    pub fn operation(&mut self, name: &str) -> Result<OperationBuilder<'_>, DomainError> {
        self.check_uniqueness(name)?;
        let op = Operation::new(name);
        self.check_not_generated(&op.method_name)?;
        let TaskBuilder { scope, task } = self;
        let op = push_last(&mut task.operations, op);
        Ok(OperationBuilder {
            scope: &mut **scope,
            op,
        })
    }

    /// An operation implemented in the base class, invisible to the user
    /// class.
    pub fn hidden_operation(
        &mut self,
        name: &str,
        body: impl Into<String>,
    ) -> Result<OperationBuilder<'_>, DomainError> {
        let mut builder = self.operation(name)?;
        builder.op.hidden = true;
        builder.op.body = Some(body.into());
        Ok(builder)
    }

    /// Legacy declaration form.
    pub fn method(&mut self, name: &str) -> Result<(), DomainError> {
        Err(DomainError::UnsupportedOperation {
            form: format!("method '{}'", name),
            hint: "methods must be replaced by operations. Use operation".into(),
        })
    }

    /// Legacy declaration form.
    pub fn command(&mut self, name: &str) -> Result<(), DomainError> {
        Err(DomainError::UnsupportedOperation {
            form: format!("command '{}'", name),
            hint: "commands must be replaced by operations. Use operation".into(),
        })
    }

    /// Add code to a lifecycle hook of the base class.
    pub fn in_base_hook(&mut self, hook: &str, code: impl Into<CodeSlot>) -> Result<&mut Self, DomainError> {
        let hook: Hook = hook.parse()?;
        self.task.declared.in_base_hook(hook, code);
        Ok(self)
    }

    pub fn add_base_header_code(&mut self, code: impl Into<CodeSlot>, placement: CodePlacement) -> &mut Self {
        self.task.declared.add_base_header_code(code, placement);
        self
    }

    pub fn add_base_implementation_code(
        &mut self,
        code: impl Into<CodeSlot>,
        placement: CodePlacement,
    ) -> &mut Self {
        self.task.declared.add_base_implementation_code(code, placement);
        self
    }

    /// Direct access to the explicitly declared records, for plugins.
    pub fn records(&mut self) -> &mut GenerationRecords {
        &mut self.task.declared
    }

    pub fn extension(&mut self, extension: Arc<dyn TaskExtension>) -> &mut Self {
        self.task.extensions.push(extension);
        self
    }

    pub fn add_generation_handler(&mut self, handler: GenerationHandler) -> &mut Self {
        self.task.generation_handlers.push(handler);
        self
    }

    /// `/boost/shared_ptr<T>`, defined on the project typekit if needed.
    pub fn shared_ptr(&mut self, type_name: &str) -> Result<TypeName, DomainError> {
        self.smart_pointer("/boost/shared_ptr", type_name)
    }

    /// `/RTT/extras/ReadOnlyPointer<T>`, defined on the project typekit if
    /// needed.
    pub fn ro_ptr(&mut self, type_name: &str) -> Result<TypeName, DomainError> {
        self.smart_pointer("/RTT/extras/ReadOnlyPointer", type_name)
    }

    fn smart_pointer(&mut self, container: &str, type_name: &str) -> Result<TypeName, DomainError> {
        let base = self.scope.resolve_type(type_name)?;
        let full = TypeName::new(format!("{}<{}>", container, base.name()));
        if self.scope.resolve_type(full.as_str()).is_err() {
            self.scope.define_type(TypeDef::new(
                full.clone(),
                TypeCategory::Container {
                    kind: container.to_string(),
                    element: base.name().clone(),
                },
            ))?;
        }
        Ok(full)
    }

    pub fn build(self) -> TaskContext {
        self.task
    }
}

fn push_last<T>(items: &mut Vec<T>, item: T) -> &mut T {
    items.push(item);
    let last = items.len() - 1;
    &mut items[last]
}

/// Fluent configuration of a freshly declared operation.
pub struct OperationBuilder<'a> {
    scope: &'a mut dyn DeclarationScope,
    op: &'a mut Operation,
}

impl OperationBuilder<'_> {
    pub fn argument(&mut self, name: &str, type_name: &str, doc: &str) -> Result<&mut Self, DomainError> {
        DomainValidator::validate_identifier(name)?;
        let def = self.scope.resolve_type(type_name)?;
        self.op.arguments.push(Argument {
            name: name.to_string(),
            type_ref: TypeRef::from(&def),
            doc: doc.to_string(),
        });
        Ok(self)
    }

    pub fn returns(&mut self, type_name: &str) -> Result<&mut Self, DomainError> {
        let def = self.scope.resolve_type(type_name)?;
        self.op.return_type = if def.is_null() {
            None
        } else {
            Some(TypeRef::from(&def))
        };
        Ok(self)
    }

    pub fn doc(&mut self, text: impl Into<String>) -> &mut Self {
        self.op.doc = Some(text.into());
        self
    }

    pub fn runs_in_caller_thread(&mut self) -> &mut Self {
        self.op.thread = ThreadFlag::ClientThread;
        self
    }

    pub fn method_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.op.method_name = name.into();
        self
    }

    pub fn body(&mut self, code: impl Into<String>) -> &mut Self {
        self.op.body = Some(code.into());
        self
    }

    /// Keep the handler in the base class. A body must be given before
    /// generation.
    pub fn hidden(&mut self) -> &mut Self {
        self.op.hidden = true;
        self
    }
}
