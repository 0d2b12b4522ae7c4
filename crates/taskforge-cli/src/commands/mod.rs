//! Command handlers.
//!
//! Each handler translates parsed arguments into calls on the core services
//! and renders the result. The helpers below wire the on-disk adapters
//! together the same way for every command.

pub mod completions;
pub mod config;
pub mod deps;
pub mod generate;
pub mod init;
pub mod list;
pub mod typelist;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use taskforge_adapters::{
    DirectoryTaskLibrarySource, DirectoryTypekitSource, ManifestPackageResolver,
    XmlDescriptorParser, read_project,
};
use taskforge_core::{
    application::{ProjectLoader, TypekitImporter},
    domain::{ProjectModel, TaskContext},
};

use crate::{
    cli::SearchArgs,
    config::{AppConfig, SearchConfig},
    error::{CliError, CliResult},
};

/// Command-line directories first, then the configured ones.
pub(crate) fn search_paths(args: &SearchArgs, config: &AppConfig) -> SearchConfig {
    fn merge(first: &[PathBuf], then: &[PathBuf]) -> Vec<PathBuf> {
        let mut paths = first.to_vec();
        for path in then {
            if !paths.contains(path) {
                paths.push(path.clone());
            }
        }
        paths
    }

    SearchConfig {
        typekit_paths: merge(&args.typekit_paths, &config.search.typekit_paths),
        task_library_paths: merge(&args.task_library_paths, &config.search.task_library_paths),
        package_paths: merge(&args.package_paths, &config.search.package_paths),
    }
}

pub(crate) fn importer(search: &SearchConfig) -> Arc<TypekitImporter> {
    Arc::new(TypekitImporter::new(
        Box::new(DirectoryTypekitSource::new(search.typekit_paths.clone())),
        Box::new(XmlDescriptorParser::new()),
        Box::new(ManifestPackageResolver::new(search.package_paths.clone())),
    ))
}

pub(crate) fn loader(search: &SearchConfig) -> ProjectLoader {
    ProjectLoader::new(
        importer(search),
        Box::new(DirectoryTaskLibrarySource::new(
            search.task_library_paths.clone(),
        )),
    )
}

/// Read a project file and load everything it imports.
pub(crate) fn load_project(path: &Path, search: &SearchConfig) -> CliResult<ProjectModel> {
    if !path.is_file() {
        return Err(CliError::ProjectFileNotFound {
            path: path.to_path_buf(),
        });
    }
    let decl = read_project(path)?;
    debug!(
        project = %decl.name,
        tasks = decl.tasks.len(),
        typekits = ?decl.using_typekit,
        task_libraries = ?decl.using_task_library,
        "Project file read"
    );
    Ok(loader(search).load(&decl)?)
}

/// Directory a project's generated tree goes to by default.
pub(crate) fn project_dir(project_file: &Path) -> PathBuf {
    match project_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// The project's own tasks, or the named ones.
///
/// Names may be given with or without the project prefix.
pub(crate) fn select_tasks(
    project: &ProjectModel,
    names: &[String],
) -> CliResult<Vec<Arc<TaskContext>>> {
    if names.is_empty() {
        return Ok(project.self_tasks().cloned().collect());
    }
    names
        .iter()
        .map(|name| {
            project
                .find_local_task(name)
                .ok_or_else(|| CliError::TaskNotFound {
                    name: name.clone(),
                    project: project.name().to_string(),
                    available: project.self_tasks().map(|t| t.name().to_string()).collect(),
                })
        })
        .collect()
}
