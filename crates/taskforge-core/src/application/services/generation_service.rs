//! Generation Service - main application orchestrator.
//!
//! For every task defined by the project:
//! 1. Resolve the typekits and task libraries it depends on
//! 2. Collect records and render the base and user files
//! 3. Save them under the preservation policy
//! 4. Link the headers into the fake install tree

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    application::{
        ports::{Filesystem, TemplateRenderer},
        services::{
            DependencyResolver, FilePreservationPolicy, GenerationOptions, SaveOutcome,
            TaskGenerator,
        },
    },
    domain::{DomainError, ProjectModel, TaskContext},
    error::ForgeResult,
};

/// Summary of one generation run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub run_id: Uuid,
    pub project: String,
    pub tasks: Vec<TaskReport>,
}

impl GenerationReport {
    pub fn count(&self, outcome: SaveOutcome) -> usize {
        self.tasks
            .iter()
            .flat_map(|t| &t.files)
            .filter(|(_, o)| *o == outcome)
            .count()
    }

    pub fn file_count(&self) -> usize {
        self.tasks.iter().map(|t| t.files.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task: String,
    /// Paths relative to the project directory.
    pub files: Vec<(PathBuf, SaveOutcome)>,
    pub typekits: Vec<String>,
    pub task_libraries: Vec<String>,
    /// User files, relative to the project directory, whose constructors
    /// still take an initial state.
    pub stale_constructors: Vec<PathBuf>,
}

pub struct GenerationService {
    renderer: Box<dyn TemplateRenderer>,
    filesystem: Box<dyn Filesystem>,
    options: GenerationOptions,
}

impl GenerationService {
    pub fn new(
        renderer: Box<dyn TemplateRenderer>,
        filesystem: Box<dyn Filesystem>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            renderer,
            filesystem,
            options,
        }
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Generate every task defined by `project` below `base_dir`.
    ///
    /// The first failing task aborts the run.
    #[instrument(skip_all, fields(project = %project.name(), base_dir = %base_dir.display()))]
    pub fn generate(&self, project: &ProjectModel, base_dir: &Path) -> ForgeResult<GenerationReport> {
        let run_id = Uuid::new_v4();
        info!(%run_id, "Generating {} tasks", project.self_tasks().count());

        let tasks = project
            .self_tasks()
            .map(|task| self.generate_task(project, task, base_dir))
            .collect::<ForgeResult<Vec<_>>>()?;

        let report = GenerationReport {
            run_id,
            project: project.name().to_string(),
            tasks,
        };
        info!(
            written = report.count(SaveOutcome::Written),
            created = report.count(SaveOutcome::Created),
            preserved = report.count(SaveOutcome::Preserved),
            "Generation completed"
        );
        Ok(report)
    }

    #[instrument(skip_all, fields(task = %task.name()))]
    pub fn generate_task(
        &self,
        project: &ProjectModel,
        task: &TaskContext,
        base_dir: &Path,
    ) -> ForgeResult<TaskReport> {
        if task.is_external() {
            return Err(DomainError::GenerationOnImport {
                task: task.name().to_string(),
            }
            .into());
        }

        let deps = DependencyResolver::resolve(project, task);
        let files = TaskGenerator::new(project, task, &self.options)
            .generate(self.renderer.as_ref(), &deps)?;

        let policy = FilePreservationPolicy::new(self.filesystem.as_ref());
        let mut saved = Vec::with_capacity(files.file_count());
        for file in files.files() {
            let outcome = policy.save(file.area, &base_dir.join(&file.path), &file.content)?;
            saved.push((file.path.clone(), outcome));
        }

        let stale_constructors = self.validate_constructors(task, base_dir)?;

        for link in files.links() {
            let path = base_dir.join(&link.link);
            if let Some(parent) = path.parent() {
                self.filesystem.create_dir_all(parent)?;
            }
            self.filesystem.symlink(&base_dir.join(&link.target), &path)?;
        }

        Ok(TaskReport {
            task: task.name().to_string(),
            files: saved,
            typekits: deps.typekit_names().into_iter().map(String::from).collect(),
            task_libraries: deps
                .task_library_names()
                .into_iter()
                .map(String::from)
                .collect(),
            stale_constructors,
        })
    }

    /// Warn when a task with a fixed initial state still has a user
    /// constructor taking a state argument.
    fn validate_constructors(&self, task: &TaskContext, base_dir: &Path) -> ForgeResult<Vec<PathBuf>> {
        let mut stale = Vec::new();
        if !task.fixed_initial_state() {
            return Ok(stale);
        }
        for relative in self.options.user_files(task) {
            let path = base_dir.join(&relative);
            if !self.filesystem.exists(&path) {
                continue;
            }
            if takes_initial_state(&self.filesystem.read_file(&path)?, task.basename()) {
                warn!(
                    file = %path.display(),
                    "{} has a fixed initial state, remove the TaskCore::TaskState argument from its constructors",
                    task.name()
                );
                stale.push(relative);
            }
        }
        Ok(stale)
    }
}

/// True if a `class(...)` signature in `content` has a `TaskCore::TaskState`
/// parameter. Line comments are ignored.
fn takes_initial_state(content: &str, class: &str) -> bool {
    content.lines().any(|line| {
        let code = line.split("//").next().unwrap_or_default();
        code.match_indices(class).any(|(at, _)| {
            let before = code[..at].chars().next_back();
            if before.is_some_and(|c| c.is_alphanumeric() || c == '_') {
                return false;
            }
            let Some(args) = code[at + class.len()..].trim_start().strip_prefix('(') else {
                return false;
            };
            let args = args.split(')').next().unwrap_or_default();
            args.contains("TaskCore::TaskState")
        })
    })
}
