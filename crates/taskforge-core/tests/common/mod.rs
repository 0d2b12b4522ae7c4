//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use taskforge_core::application::{
    ApplicationError, DescriptorParser, Filesystem, GenerationOptions, GenerationService,
    PackageResolver, ProjectLoader, RawTypekit, TaskLibrarySource, TemplateRenderer,
    TypekitImporter, TypekitSource,
};
use taskforge_core::domain::{
    OpaqueEntry, PackageInfo, ProjectDecl, ProjectModel, RenderContext, TemplateId, TypeDef,
    TypeRegistry, TypekitDescriptor,
};
use taskforge_core::error::ForgeResult;

// ── Filesystem ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct FsState {
    files: HashMap<PathBuf, String>,
    writes: HashMap<PathBuf, usize>,
    dirs: HashSet<PathBuf>,
    links: HashMap<PathBuf, PathBuf>,
}

#[derive(Clone, Default)]
pub struct MemoryFs(Arc<Mutex<FsState>>);

impl MemoryFs {
    pub fn content(&self, path: impl AsRef<Path>) -> Option<String> {
        self.0.lock().unwrap().files.get(path.as_ref()).cloned()
    }

    pub fn writes(&self, path: impl AsRef<Path>) -> usize {
        self.0
            .lock()
            .unwrap()
            .writes
            .get(path.as_ref())
            .copied()
            .unwrap_or(0)
    }

    /// Simulate a hand edit.
    pub fn edit(&self, path: impl AsRef<Path>, content: &str) {
        self.0
            .lock()
            .unwrap()
            .files
            .insert(path.as_ref().to_path_buf(), content.to_string());
    }

    pub fn link(&self, path: impl AsRef<Path>) -> Option<PathBuf> {
        self.0.lock().unwrap().links.get(path.as_ref()).cloned()
    }
}

impl Filesystem for MemoryFs {
    fn create_dir_all(&self, path: &Path) -> ForgeResult<()> {
        self.0.lock().unwrap().dirs.insert(path.to_path_buf());
        Ok(())
    }

    fn write_file(&self, path: &Path, content: &str) -> ForgeResult<()> {
        let mut state = self.0.lock().unwrap();
        state.files.insert(path.to_path_buf(), content.to_string());
        *state.writes.entry(path.to_path_buf()).or_default() += 1;
        Ok(())
    }

    fn read_file(&self, path: &Path) -> ForgeResult<String> {
        self.content(path).ok_or_else(|| {
            ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "no such file".into(),
            }
            .into()
        })
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.0.lock().unwrap();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn symlink(&self, target: &Path, link: &Path) -> ForgeResult<()> {
        self.0
            .lock()
            .unwrap()
            .links
            .insert(link.to_path_buf(), target.to_path_buf());
        Ok(())
    }
}

// ── Renderer ─────────────────────────────────────────────────────────────────

/// Renders a compact view of the bindings each template would use.
pub struct StubRenderer;

impl TemplateRenderer for StubRenderer {
    fn render(&self, template: TemplateId, context: &RenderContext) -> ForgeResult<String> {
        let body = match template {
            TemplateId::TaskBaseHeader => {
                "{{TYPEKIT_INCLUDES}}\nclass {{TASK_BASENAME}}Base : public {{SUPERCLASS}}\n{{BASE_METHOD_DECLARATIONS}}\n{{BASE_MEMBER_DECLARATIONS}}\n{{HOOK_DECLARATIONS}}"
            }
            TemplateId::TaskBaseSource => {
                "{{IMPLEMENTATION_CODE_BEFORE}}\n: {{SUPERCLASS}}(name{{STATE_FORWARD}}){{INITIALIZER_LIST}}\n{{CONSTRUCTOR_CODE}}\n{{HOOK_DEFINITIONS}}\n{{BASE_METHOD_DEFINITIONS}}"
            }
            TemplateId::TaskHeader => "class {{TASK_BASENAME}}\n{{USER_METHOD_DECLARATIONS}}",
            TemplateId::TaskSource => {
                "{{TASK_BASENAME}}::{{TASK_BASENAME}}(std::string const& name{{STATE_DEFINITION_PARAMETER}})\n{{USER_METHOD_DEFINITIONS}}"
            }
        };
        Ok(context.render(body))
    }
}

// ── Typekits ─────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct Typekits {
    entries: Arc<Mutex<HashMap<String, (TypekitDescriptor, String)>>>,
    loads: Arc<AtomicUsize>,
}

impl Typekits {
    /// Register a typekit exporting `types`, all interface-visible.
    pub fn add(&self, name: &str, types: Vec<TypeDef>) -> &Self {
        self.add_with_opaques(name, types, Vec::new())
    }

    pub fn add_with_opaques(&self, name: &str, types: Vec<TypeDef>, opaques: Vec<OpaqueEntry>) -> &Self {
        let typelist = types
            .iter()
            .map(|t| t.name().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        let mut registry = TypeRegistry::new();
        for t in types {
            registry.add(t).unwrap();
        }
        self.entries.lock().unwrap().insert(
            name.to_string(),
            (TypekitDescriptor { registry, opaques }, typelist),
        );
        self
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn importer(&self) -> Arc<TypekitImporter> {
        Arc::new(TypekitImporter::new(
            Box::new(self.clone()),
            Box::new(self.clone()),
            Box::new(NoPackages),
        ))
    }
}

impl TypekitSource for Typekits {
    fn load(&self, name: &str) -> ForgeResult<Option<RawTypekit>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.get(name).map(|(_, typelist)| {
            self.loads.fetch_add(1, Ordering::SeqCst);
            RawTypekit {
                name: name.to_string(),
                package: None,
                descriptor: name.to_string(),
                typelist: typelist.clone(),
            }
        }))
    }

    fn available(&self) -> ForgeResult<Vec<String>> {
        Ok(self.entries.lock().unwrap().keys().cloned().collect())
    }
}

impl DescriptorParser for Typekits {
    fn parse(&self, source_name: &str, _document: &str) -> ForgeResult<TypekitDescriptor> {
        self.entries
            .lock()
            .unwrap()
            .get(source_name)
            .map(|(descriptor, _)| descriptor.clone())
            .ok_or_else(|| {
                ApplicationError::DescriptorParse {
                    source_name: source_name.to_string(),
                    reason: "unknown".into(),
                }
                .into()
            })
    }
}

pub struct NoPackages;

impl PackageResolver for NoPackages {
    fn resolve(&self, package: &str) -> ForgeResult<PackageInfo> {
        Err(ApplicationError::PackageNotFound {
            name: package.to_string(),
        }
        .into())
    }
}

// ── Task libraries ───────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct Libraries(Arc<HashMap<String, ProjectDecl>>);

impl Libraries {
    pub fn from_toml(sources: &[&str]) -> Self {
        let decls = sources
            .iter()
            .map(|text| {
                let decl: ProjectDecl = toml::from_str(text).unwrap();
                (decl.name.clone(), decl)
            })
            .collect();
        Self(Arc::new(decls))
    }
}

impl TaskLibrarySource for Libraries {
    fn load(&self, name: &str) -> ForgeResult<Option<ProjectDecl>> {
        Ok(self.0.get(name).cloned())
    }

    fn available(&self) -> ForgeResult<Vec<String>> {
        Ok(self.0.keys().cloned().collect())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

pub fn decl(text: &str) -> ProjectDecl {
    toml::from_str(text).unwrap()
}

pub fn loader(typekits: &Typekits, libraries: Libraries) -> ProjectLoader {
    ProjectLoader::new(typekits.importer(), Box::new(libraries))
}

pub fn load(typekits: &Typekits, text: &str) -> ForgeResult<ProjectModel> {
    loader(typekits, Libraries::default()).load(&decl(text))
}

pub fn service(fs: &MemoryFs) -> GenerationService {
    GenerationService::new(
        Box::new(StubRenderer),
        Box::new(fs.clone()),
        GenerationOptions::default(),
    )
}

/// `base` typekit with `/base/Time`, used by most tests.
pub fn base_typekits() -> Typekits {
    let typekits = Typekits::default();
    typekits.add("base", vec![TypeDef::compound("/base/Time", &[])]);
    typekits
}
