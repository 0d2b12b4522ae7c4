//! Implementation of the `taskforge generate` command.
//!
//! Responsibility: load the project, wire the renderer and filesystem
//! adapters, run the generation service and report what happened to each
//! file. No business logic lives here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use taskforge_adapters::{BuiltinRenderer, LocalFilesystem, MemoryFilesystem};
use taskforge_core::{
    application::{
        GenerationOptions, GenerationReport, GenerationService, SaveOutcome, ports::Filesystem,
    },
    domain::TaskContext,
};

use crate::{
    cli::GenerateArgs,
    config::AppConfig,
    error::{CliResult, IntoCli},
    output::OutputManager,
};

/// Execute the `taskforge generate` command.
///
/// Dispatch sequence:
/// 1. Load the project and everything it imports
/// 2. Select the tasks to generate
/// 3. Merge flags over the configured generation options
/// 4. Generate each task, on disk or in memory for `--dry-run`
/// 5. Report the outcome of every file
#[instrument(skip_all, fields(project = %args.project.display()))]
pub fn execute(args: GenerateArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let search = super::search_paths(&args.search, &config);
    let project = super::load_project(&args.project, &search)?;
    let tasks = super::select_tasks(&project, &args.tasks)?;
    let base_dir = args
        .output
        .clone()
        .unwrap_or_else(|| super::project_dir(&args.project));

    let options = options(&args, &config);
    let template_dir = args
        .template_dir
        .as_deref()
        .or(config.generation.template_dir.as_deref());
    let renderer = match template_dir {
        Some(dir) => BuiltinRenderer::with_override_dir(dir)?,
        None => BuiltinRenderer::new(),
    };

    let dry_run = if args.dry_run {
        Some(seed_dry_run(&tasks, &base_dir, &options)?)
    } else {
        None
    };
    let filesystem: Box<dyn Filesystem> = match &dry_run {
        Some(memory) => Box::new(memory.clone()),
        None => Box::new(LocalFilesystem::new()),
    };
    let service = GenerationService::new(Box::new(renderer), filesystem, options);

    info!(
        tasks = tasks.len(),
        base_dir = %base_dir.display(),
        dry_run = args.dry_run,
        "Generation started"
    );

    let progress = output.progress(tasks.len() as u64);
    let mut reports = Vec::with_capacity(tasks.len());
    for task in &tasks {
        progress.set_message(task.name().to_string());
        let report = service.generate_task(&project, task, &base_dir);
        progress.inc(1);
        match report {
            Ok(report) => reports.push(report),
            Err(e) => {
                progress.abandon();
                return Err(e.into());
            }
        }
    }
    progress.finish_and_clear();

    let report = GenerationReport {
        run_id: Uuid::new_v4(),
        project: project.name().to_string(),
        tasks: reports,
    };

    if output.is_json() {
        output.json(&report_json(&report, &base_dir, args.dry_run))?;
        return Ok(());
    }

    print_report(&report, &base_dir, &output)?;
    if let Some(memory) = dry_run {
        output.print("")?;
        output.info("Dry run: nothing was written")?;
        for (link, target) in memory.list_links() {
            output.detail(&format!("{} -> {}", link.display(), target.display()))?;
        }
    } else {
        output.success(&format!(
            "Generated {} task(s) of '{}' in {}",
            report.tasks.len(),
            report.project,
            base_dir.display()
        ))?;
    }
    Ok(())
}

fn options(args: &GenerateArgs, config: &AppConfig) -> GenerationOptions {
    let mut options = config.generation.options();
    if args.no_fake_install {
        options.fake_install = false;
    }
    if args.no_user_templates {
        options.save_user_templates = false;
    }
    options
}

/// In-memory copy of the user files that already exist on disk, so a dry
/// run reports them as preserved.
fn seed_dry_run(
    tasks: &[Arc<TaskContext>],
    base_dir: &Path,
    options: &GenerationOptions,
) -> CliResult<MemoryFilesystem> {
    let memory = MemoryFilesystem::new();
    for task in tasks {
        for extension in ["hpp", "cpp"] {
            let path = base_dir
                .join(options.user_dir())
                .join(format!("{}.{extension}", task.basename()));
            if path.is_file() {
                let content = std::fs::read_to_string(&path)
                    .with_cli_context(|| format!("reading {}", path.display()))?;
                memory.insert(path, content)?;
            }
        }
    }
    Ok(memory)
}

fn outcome_label(outcome: SaveOutcome) -> &'static str {
    match outcome {
        SaveOutcome::Written => "written",
        SaveOutcome::Created => "created",
        SaveOutcome::Preserved => "preserved",
    }
}

fn print_report(report: &GenerationReport, base_dir: &Path, output: &OutputManager) -> CliResult<()> {
    for task in &report.tasks {
        output.header(&task.task)?;
        for (path, outcome) in &task.files {
            output.detail(&format!("{:<9} {}", outcome_label(*outcome), path.display()))?;
        }
        for path in &task.stale_constructors {
            output.warning(&format!(
                "{} has a fixed initial state but its constructor in {} still takes a TaskCore::TaskState",
                task.task,
                display_path(base_dir, path).display()
            ))?;
        }
    }
    output.print("")?;
    output.print(&format!(
        "{} written, {} created, {} preserved",
        report.count(SaveOutcome::Written),
        report.count(SaveOutcome::Created),
        report.count(SaveOutcome::Preserved),
    ))?;
    Ok(())
}

fn display_path(base_dir: &Path, relative: &Path) -> PathBuf {
    if base_dir == Path::new(".") {
        relative.to_path_buf()
    } else {
        base_dir.join(relative)
    }
}

fn report_json(report: &GenerationReport, base_dir: &Path, dry_run: bool) -> serde_json::Value {
    json!({
        "run_id": report.run_id.to_string(),
        "project": report.project,
        "base_dir": base_dir.display().to_string(),
        "dry_run": dry_run,
        "tasks": report.tasks.iter().map(|task| json!({
            "name": task.task,
            "typekits": task.typekits,
            "task_libraries": task.task_libraries,
            "stale_constructors": task.stale_constructors.iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>(),
            "files": task.files.iter().map(|(path, outcome)| json!({
                "path": path.display().to_string(),
                "outcome": outcome_label(*outcome),
            })).collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
    })
}
