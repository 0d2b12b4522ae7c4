//! Per-task generation: collect records, assemble the base and user
//! classes, lay out the resulting files.
//!
//! ```text
//! own members ─┐
//! declared     ├─► GenerationRecords ─► RenderContext ─► TemplateRenderer
//! extensions   │                                            │
//! handlers    ─┘                                            ▼
//!                                  GeneratedFiles { automatic, user, links }
//! ```

use std::path::PathBuf;

use tracing::{debug, instrument};

use crate::{
    application::{ports::TemplateRenderer, services::TaskDependencies},
    domain::{
        CodePlacement, CodeSlot, DomainError, FileArea, GeneratedFiles, GeneratedMethod,
        Generatable, GenerationRecords, Hook, Operation, ProjectModel, RenderContext, Superclass,
        TaskContext, TemplateId, ThreadFlag, TypeName, TypeRef,
        entities::{codegen::indent, template::to_upper_snake_case},
    },
    error::ForgeResult,
};

const TID_BODY: &str = "#ifdef HAS_GETTID\n    return syscall(SYS_gettid);\n#else\n    return 0;\n#endif";
const TID_INCLUDES: &str = "#ifdef HAS_GETTID\n#include <sys/syscall.h>\n#endif";
const USER_STATE_TYPE: &str = "TaskCore::TaskState";

/// Where generated files go, relative to the project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    pub automatic_area: PathBuf,
    /// Link generated headers into `<automatic_area>/<project>/`.
    pub fake_install: bool,
    /// Keep a copy of the fresh user files under
    /// `<automatic_area>/templates/tasks/`.
    pub save_user_templates: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            automatic_area: PathBuf::from(".orogen"),
            fake_install: true,
            save_user_templates: true,
        }
    }
}

impl GenerationOptions {
    pub fn base_dir(&self) -> PathBuf {
        self.automatic_area.join("tasks")
    }

    pub fn user_dir(&self) -> PathBuf {
        PathBuf::from("tasks")
    }

    pub fn user_template_dir(&self) -> PathBuf {
        self.automatic_area.join("templates").join("tasks")
    }

    pub fn install_dir(&self, project: &str) -> PathBuf {
        self.automatic_area.join(project)
    }

    /// User header and source of `task`, checked for stale constructors
    /// after writing.
    pub fn user_files(&self, task: &TaskContext) -> [PathBuf; 2] {
        ["hpp", "cpp"].map(|ext| self.user_dir().join(format!("{}.{}", task.basename(), ext)))
    }
}

pub struct TaskGenerator<'a> {
    project: &'a ProjectModel,
    task: &'a TaskContext,
    options: &'a GenerationOptions,
}

impl<'a> TaskGenerator<'a> {
    pub fn new(project: &'a ProjectModel, task: &'a TaskContext, options: &'a GenerationOptions) -> Self {
        Self {
            project,
            task,
            options,
        }
    }

    /// Gather every record contributing to the task's classes.
    ///
    /// Order: generated preamble, own members, explicitly declared records,
    /// extensions, then generation handlers in registration order.
    pub fn collect(&self) -> Result<GenerationRecords, DomainError> {
        let task = self.task;
        if task.is_external() {
            return Err(DomainError::GenerationOnImport {
                task: task.name().to_string(),
            });
        }
        self.check_opaques()?;

        let inherited = match task.superclass() {
            Superclass::Task(parent) => parent.base_method_names(),
            Superclass::Framework(_) => Default::default(),
        };
        let mut records = GenerationRecords::new().with_inherited_methods(inherited);

        if task.superclass().is_framework_root() {
            for op in self.preamble() {
                op.register_for_generation(task, &mut records)?;
            }
            records.add_base_implementation_code(TID_INCLUDES, CodePlacement::BeforeClass);
        } else {
            records
                .add_base_method("std::string", "getModelName", "")?
                .body(format!("    return \"{}\";", task.name()));
        }

        for op in task.operations() {
            op.register_for_generation(task, &mut records)?;
        }
        for property in task.properties() {
            property.register_for_generation(task, &mut records)?;
        }
        for attribute in task.attributes() {
            attribute.register_for_generation(task, &mut records)?;
        }
        for port in task.ports().iter().chain(task.dynamic_ports()) {
            port.register_for_generation(task, &mut records)?;
        }
        records.extend(task.declared_records())?;

        for extension in task.extensions() {
            debug!(extension = extension.name(), "Registering extension");
            extension.register_for_generation(task, &mut records)?;
        }
        for handler in task.generation_handlers() {
            handler.call(task, &mut records)?;
        }
        Ok(records)
    }

    /// Every opaque type reachable from the interface must have a
    /// marshalling definition in some loaded typekit.
    fn check_opaques(&self) -> Result<(), DomainError> {
        let registry = self.project.registry();
        for type_name in self.task.interface_types() {
            if let Some(missing) = registry
                .opaques_in(&type_name)
                .find(|opaque| self.project.opaque_for(opaque).is_none())
            {
                return Err(DomainError::MissingOpaqueDefinition {
                    task: self.task.name().to_string(),
                    type_name: missing.to_string(),
                });
            }
        }
        Ok(())
    }

    fn preamble(&self) -> [Operation; 2] {
        let mut model_name = Operation::new("getModelName");
        model_name.hidden = true;
        model_name.thread = ThreadFlag::ClientThread;
        model_name.return_type = Some(TypeRef {
            name: TypeName::new("/std/string"),
            numeric: false,
        });
        model_name.body = Some(format!("    return \"{}\";", self.task.name()));
        model_name.doc = Some("returns the oroGen model name for this task".into());

        let mut tid = Operation::new("__orogen_getTID");
        tid.hidden = true;
        tid.return_type = Some(TypeRef {
            name: TypeName::new("/int32_t"),
            numeric: true,
        });
        tid.body = Some(TID_BODY.into());
        tid.doc = Some("returns the PID for this task".into());

        [model_name, tid]
    }

    /// Variable bindings shared by the four task templates.
    pub fn render_context(
        &self,
        records: &GenerationRecords,
        deps: &TaskDependencies,
    ) -> RenderContext {
        let task = self.task;
        let basename = task.basename();
        let superclass = superclass_cxx(task);

        let mut ctx = RenderContext::new(self.project.name())
            .with_variable("TASK_NAME", task.name())
            .with_variable("TASK_BASENAME", basename)
            .with_variable("TASK_BASENAME_UPPER", to_upper_snake_case(basename))
            .with_variable("TASK_DOC", doc_comment(task.doc()))
            .with_variable("SUPERCLASS", superclass.as_str())
            .with_variable("SUPERCLASS_INCLUDE", superclass_include(task))
            .with_variable("TYPEKIT_INCLUDES", self.typekit_includes(deps))
            .with_variable("HEADER_CODE_BEFORE", join_slots(records.base_header_code(CodePlacement::BeforeClass)))
            .with_variable("HEADER_CODE_AFTER", join_slots(records.base_header_code(CodePlacement::AfterClass)))
            .with_variable(
                "IMPLEMENTATION_CODE_BEFORE",
                join_slots(records.base_implementation_code(CodePlacement::BeforeClass)),
            )
            .with_variable(
                "IMPLEMENTATION_CODE_AFTER",
                join_slots(records.base_implementation_code(CodePlacement::AfterClass)),
            );

        // Base class
        let members = records.base_members();
        ctx.set(
            "BASE_MEMBER_DECLARATIONS",
            block(members.iter().filter_map(|m| m.declaration()), 8),
        );
        ctx.set(
            "INITIALIZER_LIST",
            members
                .iter()
                .filter_map(|m| m.initializer.as_ref())
                .map(|init| format!("\n    , {}", init.render()))
                .collect::<String>(),
        );
        ctx.set(
            "CONSTRUCTOR_CODE",
            block(members.iter().filter_map(|m| m.constructor.as_ref()).map(CodeSlot::render), 4),
        );
        ctx.set(
            "DESTRUCTOR_CODE",
            block(members.iter().filter_map(|m| m.destructor.as_ref()).map(CodeSlot::render), 4),
        );
        ctx.set(
            "BASE_METHOD_DECLARATIONS",
            block(records.base_methods().iter().map(GeneratedMethod::declaration), 8),
        );
        ctx.set(
            "BASE_METHOD_DEFINITIONS",
            definitions(records.base_methods(), basename),
        );

        let hooks: Vec<Hook> = Hook::ALL
            .into_iter()
            .filter(|h| !records.hook_code(*h).is_empty())
            .collect();
        ctx.set(
            "HOOK_DECLARATIONS",
            block(hooks.iter().map(|h| hook_declaration(*h)), 8),
        );
        ctx.set(
            "HOOK_DEFINITIONS",
            hooks
                .iter()
                .map(|h| base_hook_definition(*h, basename, &superclass, records.hook_code(*h)))
                .collect::<Vec<_>>()
                .join("\n\n"),
        );

        // User class
        ctx.set(
            "USER_MEMBER_DECLARATIONS",
            block(records.user_members().iter().filter_map(|m| m.declaration()), 8),
        );
        ctx.set(
            "USER_METHOD_DECLARATIONS",
            block(records.user_methods().iter().map(GeneratedMethod::declaration), 8),
        );
        ctx.set(
            "USER_METHOD_DEFINITIONS",
            definitions(records.user_methods(), basename),
        );
        ctx.set(
            "USER_HOOK_DECLARATIONS",
            block(Hook::ALL.iter().map(|h| hook_declaration(*h)), 8),
        );
        ctx.set(
            "USER_HOOK_DEFINITIONS",
            Hook::ALL
                .iter()
                .map(|h| user_hook_definition(*h, basename))
                .collect::<Vec<_>>()
                .join("\n"),
        );

        self.bind_state_parameters(&mut ctx);
        ctx
    }

    /// Constructor parameters and forwarding for the initial state.
    ///
    /// With a fixed initial state the constructors take no state argument
    /// and the base class passes the fixed state to its superclass when
    /// the superclass still accepts one.
    fn bind_state_parameters(&self, ctx: &mut RenderContext) {
        let task = self.task;
        if task.fixed_initial_state() {
            let parent_takes_state = match task.superclass() {
                Superclass::Task(parent) => !parent.fixed_initial_state(),
                Superclass::Framework(_) => true,
            };
            let state = if task.needs_configuration() {
                "TaskCore::PreOperational"
            } else {
                "TaskCore::Stopped"
            };
            ctx.set("STATE_DECLARATION_PARAMETER", "");
            ctx.set("STATE_DEFINITION_PARAMETER", "");
            ctx.set(
                "STATE_FORWARD",
                if parent_takes_state {
                    format!(", {}", state)
                } else {
                    String::new()
                },
            );
            ctx.set("STATE_USER_FORWARD", "");
        } else {
            ctx.set(
                "STATE_DECLARATION_PARAMETER",
                format!(", {} initial_state = Stopped", USER_STATE_TYPE),
            );
            ctx.set(
                "STATE_DEFINITION_PARAMETER",
                format!(", {} initial_state", USER_STATE_TYPE),
            );
            ctx.set("STATE_FORWARD", ", initial_state");
            ctx.set("STATE_USER_FORWARD", ", initial_state");
        }
    }

    fn typekit_includes(&self, deps: &TaskDependencies) -> String {
        let mut includes: Vec<String> = deps
            .typekits
            .iter()
            .filter(|tk| !tk.is_virtual())
            .map(|tk| format!("#include <{}/typekit/Types.hpp>", tk.name()))
            .collect();
        let registry = self.project.registry();
        for type_name in self.task.interface_types() {
            for opaque in registry.opaques_in(&type_name) {
                if let Some(def) = self.project.opaque_for(&opaque) {
                    includes.extend(def.includes.iter().map(|h| format!("#include <{}>", h)));
                }
            }
        }
        includes.sort();
        includes.dedup();
        includes.join("\n")
    }

    /// Collect, render and lay out every file of the task.
    #[instrument(skip_all, fields(task = %self.task.name()))]
    pub fn generate(
        &self,
        renderer: &dyn TemplateRenderer,
        deps: &TaskDependencies,
    ) -> ForgeResult<GeneratedFiles> {
        let records = self.collect()?;
        let ctx = self.render_context(&records, deps);
        let basename = self.task.basename();
        let options = self.options;

        let mut files = GeneratedFiles::new();
        for id in TemplateId::ALL {
            let content = renderer.render(id, &ctx)?;
            let file_name = output_name(id, basename);
            if id.is_base() {
                files.add_file(FileArea::Automatic, options.base_dir().join(&file_name), content);
            } else {
                if options.save_user_templates {
                    files.add_file(
                        FileArea::Automatic,
                        options.user_template_dir().join(&file_name),
                        content.clone(),
                    );
                }
                files.add_file(FileArea::User, options.user_dir().join(&file_name), content);
            }
        }

        if options.fake_install {
            let install = options.install_dir(self.project.name());
            for id in [TemplateId::TaskHeader, TemplateId::TaskBaseHeader] {
                let file_name = output_name(id, basename);
                let target = if id.is_base() {
                    options.base_dir().join(&file_name)
                } else {
                    options.user_dir().join(&file_name)
                };
                files.add_link(install.join(&file_name), target);
            }
        }

        files.validate()?;
        debug!(files = files.file_count(), "Task files assembled");
        Ok(files)
    }
}

/// `TaskBase.hpp` → `DriverBase.hpp` for a task called `Driver`.
fn output_name(id: TemplateId, basename: &str) -> PathBuf {
    PathBuf::from(id.file_name().replacen("Task", basename, 1))
}

fn superclass_cxx(task: &TaskContext) -> String {
    match task.superclass() {
        Superclass::Framework(name) => name.clone(),
        Superclass::Task(parent) => parent.name().to_string(),
    }
}

fn superclass_include(task: &TaskContext) -> String {
    match task.superclass() {
        Superclass::Framework(name) => {
            format!("#include <{}.hpp>", name.replace("::", "/").replace("RTT/", "rtt/"))
        }
        Superclass::Task(parent) => format!("#include \"{}\"", parent.header_file()),
    }
}

fn doc_comment(doc: Option<&str>) -> String {
    match doc {
        Some(text) => text
            .lines()
            .map(|l| format!("     * {}", l).trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        None => "     *".to_string(),
    }
}

fn join_slots<'r>(slots: impl Iterator<Item = &'r CodeSlot>) -> String {
    slots.map(CodeSlot::render).collect::<Vec<_>>().join("\n")
}

/// Render `items` one after another, each indented by `width`.
fn block(items: impl Iterator<Item = String>, width: usize) -> String {
    items.map(|item| indent(&item, width)).collect::<Vec<_>>().join("\n")
}

fn definitions(methods: &[GeneratedMethod], basename: &str) -> String {
    methods
        .iter()
        .filter_map(|m| m.definition(basename))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn hook_declaration(hook: Hook) -> String {
    let ret = if hook.returns_bool() { "bool" } else { "void" };
    format!("{} {}();", ret, hook.method_name())
}

/// Superclass hook first, then the injected statements in order.
fn base_hook_definition(hook: Hook, basename: &str, superclass: &str, code: &[CodeSlot]) -> String {
    let method = hook.method_name();
    let statements = code
        .iter()
        .map(|slot| slot.render_indented(4))
        .collect::<Vec<_>>()
        .join("\n");
    if hook.returns_bool() {
        format!(
            "bool {basename}Base::{method}()\n{{\n    if (! {superclass}::{method}())\n        return false;\n{statements}\n    return true;\n}}"
        )
    } else {
        format!("void {basename}Base::{method}()\n{{\n    {superclass}::{method}();\n{statements}\n}}")
    }
}

fn user_hook_definition(hook: Hook, basename: &str) -> String {
    let method = hook.method_name();
    if hook.returns_bool() {
        format!(
            "bool {basename}::{method}()\n{{\n    if (! {basename}Base::{method}())\n        return false;\n    return true;\n}}"
        )
    } else {
        format!("void {basename}::{method}()\n{{\n    {basename}Base::{method}();\n}}")
    }
}
