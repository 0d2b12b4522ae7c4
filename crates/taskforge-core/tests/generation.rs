//! End-to-end generation against an in-memory filesystem.

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::{Libraries, MemoryFs, Typekits, base_typekits, decl, load, loader, service};
use taskforge_core::application::SaveOutcome;
use taskforge_core::domain::{
    DomainError, GenerationHandler, GenerationRecords, OpaqueEntry, ProjectModel, TaskContext,
    TaskExtension, TypeDef,
};
use taskforge_core::error::ForgeError;

const DRIVER: &str = r#"
    name = "demo"

    [[task]]
    name = "Driver"
    doc = "Talks to the device"

    [[task.output_port]]
    name = "time"
    type = "/base/Time"

    [[task.property]]
    name = "gain"
    type = "/double"

    [[task.operation]]
    name = "reset"
    returns = "/bool"
"#;

fn work() -> &'static Path {
    Path::new("/work")
}

#[test]
fn regeneration_rewrites_base_files_and_keeps_user_files() {
    let project = load(&base_typekits(), DRIVER).unwrap();
    let fs = MemoryFs::default();
    let service = service(&fs);

    let first = service.generate(&project, work()).unwrap();
    assert_eq!(first.tasks.len(), 1);
    assert_eq!(first.count(SaveOutcome::Created), 2);
    assert_eq!(first.count(SaveOutcome::Preserved), 0);

    let user_header = fs.content("/work/tasks/Driver.hpp").unwrap();
    let user_source = fs.content("/work/tasks/Driver.cpp").unwrap();
    let base_header = fs.content("/work/.orogen/tasks/DriverBase.hpp").unwrap();
    assert!(base_header.contains("#include <base/typekit/Types.hpp>"));
    assert!(base_header.contains("class DriverBase : public RTT::TaskContext"));
    assert!(user_header.contains("reset"));

    let second = service.generate(&project, work()).unwrap();
    assert_eq!(second.count(SaveOutcome::Created), 0);
    assert_eq!(second.count(SaveOutcome::Preserved), 2);
    assert_eq!(second.count(SaveOutcome::Written), first.count(SaveOutcome::Written));

    assert_eq!(fs.content("/work/tasks/Driver.hpp").unwrap(), user_header);
    assert_eq!(fs.content("/work/tasks/Driver.cpp").unwrap(), user_source);
    assert_eq!(fs.writes("/work/tasks/Driver.hpp"), 1);
    assert_eq!(fs.writes("/work/.orogen/tasks/DriverBase.hpp"), 2);
    assert_eq!(
        fs.content("/work/.orogen/templates/tasks/Driver.hpp").unwrap(),
        user_header
    );
}

#[test]
fn hand_edits_to_user_files_survive() {
    let project = load(&base_typekits(), DRIVER).unwrap();
    let fs = MemoryFs::default();
    let service = service(&fs);

    service.generate(&project, work()).unwrap();
    fs.edit("/work/tasks/Driver.cpp", "// my implementation\n");
    service.generate(&project, work()).unwrap();

    assert_eq!(
        fs.content("/work/tasks/Driver.cpp").unwrap(),
        "// my implementation\n"
    );
}

#[test]
fn headers_are_installed_as_links() {
    let project = load(&base_typekits(), DRIVER).unwrap();
    let fs = MemoryFs::default();
    service(&fs).generate(&project, work()).unwrap();

    assert_eq!(
        fs.link("/work/.orogen/demo/Driver.hpp").unwrap(),
        Path::new("/work/tasks/Driver.hpp")
    );
    assert_eq!(
        fs.link("/work/.orogen/demo/DriverBase.hpp").unwrap(),
        Path::new("/work/.orogen/tasks/DriverBase.hpp")
    );
}

#[test]
fn base_class_gets_the_model_name_and_handlers() {
    let project = load(&base_typekits(), DRIVER).unwrap();
    let fs = MemoryFs::default();
    service(&fs).generate(&project, work()).unwrap();

    let header = fs.content("/work/.orogen/tasks/DriverBase.hpp").unwrap();
    assert!(header.contains("virtual std::string getModelName();"));
    assert!(header.contains("virtual bool reset() = 0;"));
    assert!(header.contains("_gain"));

    let source = fs.content("/work/.orogen/tasks/DriverBase.cpp").unwrap();
    assert!(source.contains("return \"demo::Driver\";"));
}

fn handle_typekits(with_definition: bool) -> Typekits {
    let typekits = Typekits::default();
    let opaques = if with_definition {
        vec![OpaqueEntry {
            name: "/handles/Handle".into(),
            marshal_as: "/handles/HandleM".into(),
            includes: "handles/Handle.hpp".into(),
            needs_copy: "1".into(),
        }]
    } else {
        Vec::new()
    };
    typekits.add_with_opaques(
        "handles",
        vec![
            TypeDef::opaque("/handles/Handle"),
            TypeDef::compound("/handles/HandleM", &[("fd", "/int32_t")]),
        ],
        opaques,
    );
    typekits
}

const HANDLER: &str = r#"
    name = "demo"
    using_typekit = ["handles"]

    [[task]]
    name = "Opener"

    [[task.output_port]]
    name = "handle"
    type = "/handles/Handle"
"#;

#[test]
fn opaques_without_marshalling_rules_cannot_be_generated() {
    let project = load(&handle_typekits(false), HANDLER).unwrap();
    let err = service(&MemoryFs::default())
        .generate(&project, work())
        .unwrap_err();
    assert!(matches!(
        err,
        ForgeError::Domain(DomainError::MissingOpaqueDefinition { ref type_name, .. })
            if type_name == "/handles/Handle"
    ));
}

#[test]
fn opaque_headers_are_included_in_the_base_class() {
    let project = load(&handle_typekits(true), HANDLER).unwrap();
    let fs = MemoryFs::default();
    service(&fs).generate(&project, work()).unwrap();

    let header = fs.content("/work/.orogen/tasks/OpenerBase.hpp").unwrap();
    assert!(header.contains("#include <handles/Handle.hpp>"));
    assert!(header.contains("#include <handles/typekit/Types.hpp>"));
}

#[test]
fn hidden_operations_need_a_body() {
    let project = load(
        &base_typekits(),
        r#"
            name = "demo"

            [[task]]
            name = "Driver"

            [[task.operation]]
            name = "secret"
            hidden = true
        "#,
    )
    .unwrap();
    let err = service(&MemoryFs::default())
        .generate(&project, work())
        .unwrap_err();
    assert!(matches!(
        err,
        ForgeError::Domain(DomainError::MissingBody { ref operation, .. }) if operation == "secret"
    ));
}

const DRIVERS: &str = r#"
    name = "drivers"

    [[task]]
    name = "Device"

    [[task.operation]]
    name = "reset"
"#;

#[test]
fn imported_tasks_are_never_generated() {
    let project = loader(&base_typekits(), Libraries::from_toml(&[DRIVERS]))
        .load(&decl(
            r#"
                name = "demo"
                using_task_library = ["drivers"]

                [[task]]
                name = "Driver"
                subclasses = "drivers::Device"
            "#,
        ))
        .unwrap();
    let fs = MemoryFs::default();
    let service = service(&fs);

    let device = project.find_task_context("drivers::Device").unwrap();
    let err = service.generate_task(&project, &device, work()).unwrap_err();
    assert!(matches!(
        err,
        ForgeError::Domain(DomainError::GenerationOnImport { .. })
    ));

    let report = service.generate(&project, work()).unwrap();
    assert_eq!(report.tasks.len(), 1);
    assert_eq!(report.tasks[0].task, "demo::Driver");
    assert_eq!(report.tasks[0].task_libraries, ["drivers"]);
    assert!(fs.content("/work/tasks/Device.hpp").is_none());

    let header = fs.content("/work/.orogen/tasks/DriverBase.hpp").unwrap();
    assert!(header.contains("class DriverBase : public drivers::Device"));
}

#[derive(Debug)]
struct Tracing;

impl TaskExtension for Tracing {
    fn name(&self) -> &str {
        "tracing"
    }

    fn register_for_generation(
        &self,
        _task: &TaskContext,
        records: &mut GenerationRecords,
    ) -> Result<(), DomainError> {
        records
            .add_base_method("void", "traceState", "")?
            .body("    // trace");
        Ok(())
    }
}

#[test]
fn handlers_run_after_extensions() {
    let typekits = base_typekits();
    let loader = loader(&typekits, Libraries::default());
    let mut project = loader.load(&decl("name = \"demo\"\n")).unwrap();
    loader
        .declare_with(&mut project, "Monitor", |task| {
            task.extension(Arc::new(Tracing));
            task.add_generation_handler(GenerationHandler::new(|_task, records| {
                let traced = records.has_base_method("traceState");
                records
                    .add_base_method("void", "afterTrace", "")?
                    .body(format!("    // traced: {}", traced));
                Ok(())
            }));
            Ok(())
        })
        .unwrap();

    let fs = MemoryFs::default();
    service(&fs).generate(&project, work()).unwrap();
    let source = fs.content("/work/.orogen/tasks/MonitorBase.cpp").unwrap();
    assert!(source.contains("// traced: true"));
    assert!(source.find("traceState").unwrap() < source.find("afterTrace").unwrap());
}

fn fixed_state_project() -> ProjectModel {
    load(
        &base_typekits(),
        "name = \"demo\"\n[[task]]\nname = \"Driver\"\nfixed_initial_state = true\n",
    )
    .unwrap()
}

#[test]
fn stale_state_constructors_are_flagged() {
    let project = fixed_state_project();
    let fs = MemoryFs::default();
    let service = service(&fs);

    let report = service.generate(&project, work()).unwrap();
    assert!(report.tasks[0].stale_constructors.is_empty());
    let fresh = fs.content("/work/tasks/Driver.cpp").unwrap();
    assert!(!fresh.contains("TaskCore::TaskState"));

    fs.edit(
        "/work/tasks/Driver.cpp",
        "Driver::Driver(std::string const& name, TaskCore::TaskState initial_state)\n",
    );
    let report = service.generate(&project, work()).unwrap();
    assert_eq!(
        report.tasks[0].stale_constructors,
        vec![PathBuf::from("tasks/Driver.cpp")]
    );
}

#[test]
fn stale_constructor_in_the_header_alone_is_flagged() {
    let project = fixed_state_project();
    let fs = MemoryFs::default();
    let service = service(&fs);
    service.generate(&project, work()).unwrap();

    fs.edit(
        "/work/tasks/Driver.hpp",
        "class Driver : public DriverBase {\n    Driver(std::string const& name, TaskCore::TaskState initial_state = Stopped);\n};\n",
    );
    let report = service.generate(&project, work()).unwrap();
    assert_eq!(
        report.tasks[0].stale_constructors,
        vec![PathBuf::from("tasks/Driver.hpp")]
    );
}

#[test]
fn state_type_outside_constructors_is_not_flagged() {
    let project = fixed_state_project();
    let fs = MemoryFs::default();
    let service = service(&fs);
    service.generate(&project, work()).unwrap();

    let source = fs.content("/work/tasks/Driver.cpp").unwrap();
    fs.edit(
        "/work/tasks/Driver.cpp",
        &format!("// no TaskCore::TaskState argument since Driver(name) took over\n{source}"),
    );
    let report = service.generate(&project, work()).unwrap();
    assert!(report.tasks[0].stale_constructors.is_empty());
}

#[test]
fn state_parameter_is_forwarded_by_default() {
    let project = load(&base_typekits(), "name = \"demo\"\n[[task]]\nname = \"Driver\"\n").unwrap();
    let fs = MemoryFs::default();
    service(&fs).generate(&project, work()).unwrap();

    let user = fs.content("/work/tasks/Driver.cpp").unwrap();
    assert!(user.contains("TaskCore::TaskState initial_state"));
    let base = fs.content("/work/.orogen/tasks/DriverBase.cpp").unwrap();
    assert!(base.contains("RTT::TaskContext(name, initial_state)"));
}

#[test]
fn generated_method_names_fail_at_declaration() {
    let err = load(
        &base_typekits(),
        "name = \"demo\"\n[[task]]\nname = \"Driver\"\n[[task.operation]]\nname = \"getModelName\"\n",
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ForgeError::Domain(DomainError::DuplicateMember { ref name, .. }) if name == "getModelName"
    ));
}
