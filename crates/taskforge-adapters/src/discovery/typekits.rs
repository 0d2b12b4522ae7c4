//! Typekits stored as descriptor + typelist pairs.

use std::path::PathBuf;

use tracing::{debug, instrument};

use taskforge_core::{
    application::ports::{RawTypekit, TypekitSource},
    error::ForgeResult,
};

use super::{find_in, names_with_suffix, read};

const DESCRIPTOR_SUFFIX: &str = ".tlb";
const TYPELIST_SUFFIX: &str = ".typelist";
const PACKAGE_SUFFIX: &str = ".package";

/// Finds `<name>.tlb` / `<name>.typelist` pairs in a search path.
#[derive(Debug, Clone, Default)]
pub struct DirectoryTypekitSource {
    search_path: Vec<PathBuf>,
}

impl DirectoryTypekitSource {
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }
}

impl TypekitSource for DirectoryTypekitSource {
    #[instrument(skip(self))]
    fn load(&self, name: &str) -> ForgeResult<Option<RawTypekit>> {
        let Some(descriptor_path) = find_in(&self.search_path, &format!("{name}{DESCRIPTOR_SUFFIX}"))
        else {
            return Ok(None);
        };
        // Both files live side by side
        let dir = descriptor_path.parent().map(PathBuf::from).unwrap_or_default();
        let typelist_path = dir.join(format!("{name}{TYPELIST_SUFFIX}"));
        let package_path = dir.join(format!("{name}{PACKAGE_SUFFIX}"));

        let descriptor = read(&descriptor_path)?;
        let typelist = read(&typelist_path)?;
        let package = if package_path.is_file() {
            Some(read(&package_path)?.trim().to_string()).filter(|p| !p.is_empty())
        } else {
            None
        };

        debug!(path = %descriptor_path.display(), ?package, "Typekit files found");
        Ok(Some(RawTypekit {
            name: name.to_string(),
            package,
            descriptor,
            typelist,
        }))
    }

    fn available(&self) -> ForgeResult<Vec<String>> {
        Ok(names_with_suffix(&self.search_path, DESCRIPTOR_SUFFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn typekit_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("base.tlb"), "<typelib/>").unwrap();
        fs::write(dir.path().join("base.typelist"), "/base/Time\n").unwrap();
        fs::write(dir.path().join("base.package"), "base-typekit\n").unwrap();
        fs::write(dir.path().join("geo.tlb"), "<typelib/>").unwrap();
        fs::write(dir.path().join("geo.typelist"), "").unwrap();
        dir
    }

    #[test]
    fn loads_descriptor_typelist_and_package() {
        let dir = typekit_dir();
        let source = DirectoryTypekitSource::new(vec![dir.path().to_path_buf()]);

        let raw = source.load("base").unwrap().unwrap();
        assert_eq!(raw.descriptor, "<typelib/>");
        assert_eq!(raw.typelist, "/base/Time\n");
        assert_eq!(raw.package.as_deref(), Some("base-typekit"));

        assert_eq!(source.load("geo").unwrap().unwrap().package, None);
        assert!(source.load("missing").unwrap().is_none());
        assert_eq!(source.available().unwrap(), ["base", "geo"]);
    }

    #[test]
    fn earlier_directories_win() {
        let first = TempDir::new().unwrap();
        fs::write(first.path().join("base.tlb"), "<typelib></typelib>").unwrap();
        fs::write(first.path().join("base.typelist"), "").unwrap();
        let second = typekit_dir();

        let source = DirectoryTypekitSource::new(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        assert_eq!(source.load("base").unwrap().unwrap().descriptor, "<typelib></typelib>");
    }

    #[test]
    fn a_descriptor_without_typelist_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("half.tlb"), "<typelib/>").unwrap();
        let source = DirectoryTypekitSource::new(vec![dir.path().to_path_buf()]);
        assert!(source.load("half").is_err());
    }
}
