//! Implementation of the `taskforge list` command.

use serde_json::json;

use taskforge_adapters::DirectoryTaskLibrarySource;
use taskforge_core::{application::ports::TaskLibrarySource, domain::TaskContext};

use crate::{
    cli::{ListArgs, ListFormat, ListTarget},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(args: ListArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let search = super::search_paths(&args.search, &config);
    let format = if output.is_json() {
        ListFormat::Json
    } else {
        args.format
    };

    match args.what {
        ListTarget::Typekits => {
            let names = super::importer(&search).available()?;
            print_names("Available typekits:", &names, format, &output)
        }
        ListTarget::Libraries => {
            let names =
                DirectoryTaskLibrarySource::new(search.task_library_paths.clone()).available()?;
            print_names("Available task libraries:", &names, format, &output)
        }
        ListTarget::Tasks { project } => {
            let project = super::load_project(&project, &search)?;
            let tasks: Vec<&TaskContext> = project.tasks().iter().map(AsRef::as_ref).collect();
            match format {
                ListFormat::Table => {
                    output.header(&format!("Tasks of '{}':", project.name()))?;
                    for task in tasks {
                        output.print(&task_row(task))?;
                    }
                }
                ListFormat::List => {
                    for task in tasks {
                        output.data(task.name())?;
                    }
                }
                ListFormat::Json => {
                    let value = tasks.into_iter().map(task_json).collect::<Vec<_>>();
                    output.json(&serde_json::Value::Array(value))?;
                }
            }
            Ok(())
        }
    }
}

fn print_names(
    header: &str,
    names: &[String],
    format: ListFormat,
    output: &OutputManager,
) -> CliResult<()> {
    match format {
        ListFormat::Table => {
            output.header(header)?;
            if names.is_empty() {
                output.detail("none found, check the search paths")?;
            }
            for name in names {
                output.print(&format!("  {name}"))?;
            }
        }
        ListFormat::List => {
            for name in names {
                output.data(name)?;
            }
        }
        ListFormat::Json => output.json(&json!(names))?,
    }
    Ok(())
}

fn task_row(task: &TaskContext) -> String {
    let origin = if task.is_external() { " (imported)" } else { "" };
    format!(
        "  {}{} : {}  [{} ports, {} properties, {} operations]",
        task.name(),
        origin,
        task.superclass().name(),
        task.ports().len(),
        task.properties().len(),
        task.operations().len()
    )
}

fn task_json(task: &TaskContext) -> serde_json::Value {
    json!({
        "name": task.name(),
        "superclass": task.superclass().name(),
        "imported": task.is_external(),
        "doc": task.doc(),
        "needs_configuration": task.needs_configuration(),
        "ports": task.ports().iter().map(|p| json!({
            "name": p.name,
            "direction": p.direction.to_string(),
            "type": p.type_ref.as_ref().map(|t| t.name.as_str()),
        })).collect::<Vec<_>>(),
        "properties": task.properties().iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        "operations": task.operations().iter().map(|o| o.name.as_str()).collect::<Vec<_>>(),
    })
}
