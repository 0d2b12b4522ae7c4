//! On-disk discovery of typekits, packages and task libraries.
//!
//! Every source is configured with an ordered list of search directories.
//! The first directory holding a matching file wins.
//!
//! ```text
//! typekit_paths/
//! ├── base.tlb            ← XML type descriptor
//! ├── base.typelist       ← exported names, `0` flag for internal types
//! └── base.package        ← optional: name of the providing package
//! package_paths/
//! └── base-typekit.toml   ← package manifest
//! task_library_paths/
//! └── drivers.orogen.toml ← task library declaration
//! ```

mod packages;
mod task_libraries;
mod typekits;

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

pub use packages::{ManifestPackageResolver, PackageManifest};
pub use task_libraries::DirectoryTaskLibrarySource;
pub use typekits::DirectoryTypekitSource;

/// First `<dir>/<file_name>` that exists.
fn find_in(search_path: &[PathBuf], file_name: &str) -> Option<PathBuf> {
    search_path
        .iter()
        .map(|dir| dir.join(file_name))
        .find(|candidate| candidate.is_file())
}

/// Names of the files directly under the search directories ending in
/// `suffix`, with the suffix stripped. Sorted, without duplicates.
fn names_with_suffix(search_path: &[PathBuf], suffix: &str) -> Vec<String> {
    let mut names: Vec<String> = search_path
        .iter()
        .filter(|dir| dir.is_dir())
        .flat_map(|dir| WalkDir::new(dir).min_depth(1).max_depth(1))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            entry
                .file_name()
                .to_str()
                .and_then(|name| name.strip_suffix(suffix))
                .map(str::to_string)
        })
        .collect();
    names.sort();
    names.dedup();
    names
}

fn read(path: &Path) -> taskforge_core::error::ForgeResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        taskforge_core::application::ApplicationError::FilesystemError {
            path: path.to_path_buf(),
            reason: format!("Failed to read file: {}", e),
        }
        .into()
    })
}
