//! Implementation of the `taskforge deps` command.

use serde_json::json;
use tracing::instrument;

use taskforge_core::application::{DependencyResolver, TaskDependencies};

use crate::{cli::DepsArgs, config::AppConfig, error::CliResult, output::OutputManager};

#[instrument(skip_all, fields(project = %args.project.display()))]
pub fn execute(args: DepsArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let search = super::search_paths(&args.search, &config);
    let project = super::load_project(&args.project, &search)?;
    let tasks = super::select_tasks(&project, &args.tasks)?;

    let resolved: Vec<_> = tasks
        .iter()
        .map(|task| (task, DependencyResolver::resolve(&project, task)))
        .collect();

    if output.is_json() {
        let value = resolved
            .iter()
            .map(|(task, deps)| {
                json!({
                    "task": task.name(),
                    "typekits": typekit_entries(deps),
                    "task_libraries": deps.task_library_names(),
                })
            })
            .collect::<Vec<_>>();
        output.json(&serde_json::Value::Array(value))?;
        return Ok(());
    }

    for (task, deps) in &resolved {
        output.header(task.name())?;
        if deps.typekits.is_empty() && deps.task_libraries.is_empty() {
            output.detail("no dependencies")?;
            continue;
        }
        for typekit in &deps.typekits {
            let package = typekit.pkg_name().unwrap_or("-");
            output.detail(&format!("typekit       {} ({package})", typekit.name()))?;
            for dir in typekit.include_dirs() {
                output.detail(&format!("  -I{}", dir.display()))?;
            }
        }
        for library in deps.task_library_names() {
            output.detail(&format!("task library  {library}"))?;
        }
    }
    Ok(())
}

fn typekit_entries(deps: &TaskDependencies) -> Vec<serde_json::Value> {
    deps.typekits
        .iter()
        .map(|typekit| {
            json!({
                "name": typekit.name(),
                "package": typekit.pkg_name(),
                "include_dirs": typekit
                    .include_dirs()
                    .iter()
                    .map(|d| d.display().to_string())
                    .collect::<Vec<_>>(),
            })
        })
        .collect()
}
