//! Task libraries stored as project declaration files.

use std::path::PathBuf;

use tracing::{instrument, warn};

use taskforge_core::{
    application::ports::TaskLibrarySource, domain::ProjectDecl, error::ForgeResult,
};

use super::{find_in, names_with_suffix};
use crate::project_file::{PROJECT_FILE_SUFFIX, read_project};

/// Finds `<name>.orogen.toml` in a search path.
#[derive(Debug, Clone, Default)]
pub struct DirectoryTaskLibrarySource {
    search_path: Vec<PathBuf>,
}

impl DirectoryTaskLibrarySource {
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }
}

impl TaskLibrarySource for DirectoryTaskLibrarySource {
    #[instrument(skip(self))]
    fn load(&self, name: &str) -> ForgeResult<Option<ProjectDecl>> {
        let Some(path) = find_in(&self.search_path, &format!("{name}{PROJECT_FILE_SUFFIX}")) else {
            return Ok(None);
        };
        let decl = read_project(&path)?;
        if decl.name != name {
            warn!(
                file = %path.display(),
                declared = %decl.name,
                "Task library file declares a different project name"
            );
        }
        Ok(Some(decl))
    }

    fn available(&self) -> ForgeResult<Vec<String>> {
        Ok(names_with_suffix(&self.search_path, PROJECT_FILE_SUFFIX))
    }
}
