//! Package manifests describing where a typekit's build products live.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, instrument};

use taskforge_core::{
    application::{ApplicationError, ports::PackageResolver},
    domain::PackageInfo,
    error::ForgeResult,
};

use super::{find_in, read};

const MANIFEST_SUFFIX: &str = ".toml";

/// `<package>.toml` in a package search directory.
///
/// ```toml
/// include_dirs = ["/opt/robot/include", "/opt/robot/include/base"]
/// includedir = "/opt/robot/include"
/// libdir = "/opt/robot/lib"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageManifest {
    #[serde(default)]
    pub include_dirs: BTreeSet<PathBuf>,
    #[serde(default)]
    pub includedir: Option<PathBuf>,
    #[serde(default)]
    pub libdir: Option<PathBuf>,
}

/// Resolves packages from TOML manifests.
#[derive(Debug, Clone, Default)]
pub struct ManifestPackageResolver {
    search_path: Vec<PathBuf>,
}

impl ManifestPackageResolver {
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }
}

impl PackageResolver for ManifestPackageResolver {
    #[instrument(skip(self))]
    fn resolve(&self, package: &str) -> ForgeResult<PackageInfo> {
        let path = find_in(&self.search_path, &format!("{package}{MANIFEST_SUFFIX}")).ok_or_else(
            || ApplicationError::PackageNotFound {
                name: package.to_string(),
            },
        )?;
        let manifest: PackageManifest =
            toml::from_str(&read(&path)?).map_err(|e| ApplicationError::ProjectParse {
                path: path.clone(),
                reason: e.message().to_string(),
            })?;
        debug!(path = %path.display(), "Package manifest read");

        Ok(PackageInfo {
            name: package.to_string(),
            include_dirs: manifest.include_dirs,
            includedir: manifest.includedir,
            libdir: manifest.libdir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskforge_core::error::ForgeError;
    use tempfile::TempDir;

    #[test]
    fn resolves_manifest_fields() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("base-typekit.toml"),
            "include_dirs = [\"/opt/include\"]\nlibdir = \"/opt/lib\"\n",
        )
        .unwrap();
        let resolver = ManifestPackageResolver::new(vec![dir.path().to_path_buf()]);

        let info = resolver.resolve("base-typekit").unwrap();
        assert_eq!(info.name, "base-typekit");
        assert!(info.include_dirs.contains(&PathBuf::from("/opt/include")));
        assert_eq!(info.libdir, Some(PathBuf::from("/opt/lib")));
        assert_eq!(info.includedir, None);
    }

    #[test]
    fn unknown_packages_are_not_found() {
        let resolver = ManifestPackageResolver::new(Vec::new());
        assert!(matches!(
            resolver.resolve("ghost"),
            Err(ForgeError::Application(ApplicationError::PackageNotFound { .. }))
        ));
    }
}
