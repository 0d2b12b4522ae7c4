//! Reading declarative project files (`*.orogen.toml`).

use std::path::Path;

use tracing::debug;

use taskforge_core::{
    application::ApplicationError, domain::ProjectDecl, error::ForgeResult,
};

/// File suffix of project and task-library declarations.
pub const PROJECT_FILE_SUFFIX: &str = ".orogen.toml";

/// Read and parse a project declaration.
pub fn read_project(path: &Path) -> ForgeResult<ProjectDecl> {
    let text = std::fs::read_to_string(path).map_err(|e| ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to read project file: {}", e),
    })?;
    parse_project(path, &text)
}

/// Parse a project declaration already read from `path`.
pub fn parse_project(path: &Path, text: &str) -> ForgeResult<ProjectDecl> {
    let decl: ProjectDecl = toml::from_str(text).map_err(|e| ApplicationError::ProjectParse {
        path: path.to_path_buf(),
        reason: e.message().to_string(),
    })?;
    debug!(project = %decl.name, tasks = decl.tasks.len(), "Project file parsed");
    Ok(decl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use taskforge_core::error::ForgeError;

    #[test]
    fn unknown_keys_are_reported_with_the_path() {
        let err = parse_project(
            Path::new("demo.orogen.toml"),
            "name = \"demo\"\n[[task]]\nname = \"A\"\nperiodic = 0.1\n",
        )
        .unwrap_err();
        match err {
            ForgeError::Application(ApplicationError::ProjectParse { path, reason }) => {
                assert_eq!(path, PathBuf::from("demo.orogen.toml"));
                assert!(reason.contains("periodic"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.orogen.toml");
        std::fs::write(&path, "name = \"demo\"\nusing_typekit = [\"base\"]\n").unwrap();

        let decl = read_project(&path).unwrap();
        assert_eq!(decl.name, "demo");
        assert_eq!(decl.using_typekit, ["base"]);
    }
}
