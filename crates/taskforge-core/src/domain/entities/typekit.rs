//! Typekits: named bundles of exported types plus opaque marshalling rules.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{
    entities::types::{TypeDef, TypeRegistry},
    error::DomainError,
    value_objects::TypeName,
};

// ── Typelist ─────────────────────────────────────────────────────────────────

fn declaration_grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| Regex::new(r"^(\S.*?)(?:\s+(\d+))?$").expect("typelist grammar"))
}

fn corrupt_record() -> &'static Regex {
    static CORRUPT: OnceLock<Regex> = OnceLock::new();
    CORRUPT.get_or_init(|| Regex::new(r"\s+\d+\s+\d+").expect("corruption pattern"))
}

/// The two name sets declared by a typelist file.
///
/// `interface` is always a subset of `all`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Typelist {
    pub all: BTreeSet<TypeName>,
    pub interface: BTreeSet<TypeName>,
}

impl Typelist {
    /// Parse a typelist.
    ///
    /// Each non-blank line is `<type name>` or `<type name> <flag>`, with flag
    /// `0` marking an internal-only type. Names may contain spaces
    /// (`/unsigned char[8] 0`), so the flag is the trailing digit group.
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        let mut list = Typelist::default();
        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if corrupt_record().is_match(line) {
                return Err(DomainError::MalformedDeclaration {
                    line: line.to_string(),
                    reason: "wrong type pattern".into(),
                });
            }
            let captures =
                declaration_grammar()
                    .captures(line)
                    .ok_or_else(|| DomainError::MalformedDeclaration {
                        line: line.to_string(),
                        reason: "expected '<type name> [flag]'".into(),
                    })?;

            let name = TypeName::new(&captures[1]);
            let internal = captures.get(2).is_some_and(|flag| flag.as_str() == "0");
            if !internal {
                list.interface.insert(name.clone());
            }
            list.all.insert(name);
        }
        Ok(list)
    }

    /// Serialize back to the typelist format, sorted by name.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for name in &self.all {
            out.push_str(name.as_str());
            if !self.interface.contains(name) {
                out.push_str(" 0");
            }
            out.push('\n');
        }
        out
    }

    pub fn internal(&self) -> impl Iterator<Item = &TypeName> {
        self.all.iter().filter(|n| !self.interface.contains(n))
    }
}

// ── Opaques ──────────────────────────────────────────────────────────────────

/// Raw opaque annotation as found in a type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueEntry {
    pub name: String,
    pub marshal_as: String,
    /// Colon-separated header list.
    pub includes: String,
    /// `"1"` means a copy is mandatory.
    pub needs_copy: String,
}

/// Marshalling rule for a type the registry cannot introspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueDefinition {
    pub type_name: TypeName,
    pub intermediate: TypeName,
    pub needs_copy: bool,
    pub includes: BTreeSet<String>,
}

impl OpaqueDefinition {
    pub fn from_entry(entry: &OpaqueEntry) -> Result<Self, DomainError> {
        Ok(Self {
            type_name: TypeName::parse(&entry.name)?,
            intermediate: TypeName::parse(&entry.marshal_as)?,
            needs_copy: entry.needs_copy == "1",
            includes: entry
                .includes
                .split(':')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

/// Result of parsing a type descriptor document.
#[derive(Debug, Clone, Default)]
pub struct TypekitDescriptor {
    pub registry: TypeRegistry,
    pub opaques: Vec<OpaqueEntry>,
}

// ── Package ──────────────────────────────────────────────────────────────────

/// Installation metadata of a package, as reported by package discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,
    pub include_dirs: BTreeSet<PathBuf>,
    pub includedir: Option<PathBuf>,
    pub libdir: Option<PathBuf>,
}

// ── Typekit ──────────────────────────────────────────────────────────────────

/// Types exported by one dependency unit, immutable once loaded.
#[derive(Debug, Clone)]
pub struct Typekit {
    name: String,
    package: Option<PackageInfo>,
    registry: TypeRegistry,
    typelist: Typelist,
    opaques: Vec<OpaqueDefinition>,
    opaque_registry: TypeRegistry,
    is_virtual: bool,
}

/// Interface types of the framework's built-in typekit.
pub const RTT_INTERFACE_TYPES: &[&str] = &["/bool", "/double", "/float", "/int32_t"];

/// Name under which the framework's built-in typekit is registered.
pub const RTT_TYPEKIT_NAME: &str = "rtt";

impl Typekit {
    /// Build a typekit from a parsed descriptor and typelist.
    pub fn from_parts(
        name: impl Into<String>,
        package: Option<PackageInfo>,
        descriptor: TypekitDescriptor,
        typelist: Typelist,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if let Some(stray) = typelist.interface.difference(&typelist.all).next() {
            return Err(DomainError::InconsistentTypekit {
                typekit: name,
                reason: format!("interface type '{}' is not exported", stray),
            });
        }

        let mut typekit = Self {
            name,
            package,
            registry: descriptor.registry,
            typelist,
            opaques: Vec::new(),
            opaque_registry: TypeRegistry::new(),
            is_virtual: false,
        };
        for entry in &descriptor.opaques {
            typekit.register_opaque(OpaqueDefinition::from_entry(entry)?)?;
        }
        Ok(typekit)
    }

    /// The framework's typekit: native numeric and null types only.
    ///
    /// Membership is derived from `registry` instead of a typelist.
    pub fn virtual_rtt(registry: &TypeRegistry) -> Self {
        let all = registry
            .iter()
            .filter(|t| t.is_numeric() || t.is_null())
            .map(|t| t.name().clone())
            .collect();
        let interface = RTT_INTERFACE_TYPES.iter().map(TypeName::new).collect();
        Self {
            name: RTT_TYPEKIT_NAME.to_string(),
            package: None,
            registry: registry.clone(),
            typelist: Typelist { all, interface },
            opaques: Vec::new(),
            opaque_registry: TypeRegistry::new(),
            is_virtual: true,
        }
    }

    /// Register an opaque marshalling rule on a typekit being assembled.
    pub fn with_opaque(mut self, opaque: OpaqueDefinition) -> Result<Self, DomainError> {
        self.register_opaque(opaque)?;
        Ok(self)
    }

    fn register_opaque(&mut self, opaque: OpaqueDefinition) -> Result<(), DomainError> {
        let minimal = self.registry.minimal(&opaque.type_name).map_err(|_| {
            DomainError::InconsistentTypekit {
                typekit: self.name.clone(),
                reason: format!("opaque '{}' is not defined in the registry", opaque.type_name),
            }
        })?;
        self.opaque_registry.merge(&minimal)?;
        self.opaques.retain(|o| o.type_name != opaque.type_name);
        self.opaques.push(opaque);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn typelist(&self) -> &Typelist {
        &self.typelist
    }

    pub fn opaques(&self) -> &[OpaqueDefinition] {
        &self.opaques
    }

    pub fn opaque_registry(&self) -> &TypeRegistry {
        &self.opaque_registry
    }

    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    /// True if this typekit exports `name`.
    pub fn includes(&self, name: &TypeName) -> bool {
        self.typelist.all.contains(name)
    }

    /// True if `name` is exported for use across component boundaries.
    pub fn interface_type(&self, name: &TypeName) -> bool {
        self.typelist.interface.contains(name)
    }

    pub fn has_opaques(&self) -> bool {
        self.registry.iter().any(TypeDef::is_opaque)
    }

    pub fn opaque_for(&self, name: &TypeName) -> Option<&OpaqueDefinition> {
        self.opaques.iter().find(|o| &o.type_name == name)
    }

    pub fn pkg_name(&self) -> Option<&str> {
        self.package.as_ref().map(|p| p.name.as_str())
    }

    /// Package name of the transport plugin built for this typekit.
    pub fn transport_pkg_name(&self, transport: &str) -> Option<String> {
        self.pkg_name()
            .map(|pkg| pkg.replace("typekit", &format!("transport-{}", transport)))
    }

    pub fn include_dirs(&self) -> BTreeSet<PathBuf> {
        self.package
            .as_ref()
            .map(|p| p.include_dirs.clone())
            .unwrap_or_default()
    }

    /// `<includedir>/<name>/types`, if the package has an include dir.
    pub fn types_dir(&self) -> Option<PathBuf> {
        if self.is_virtual {
            return None;
        }
        self.package
            .as_ref()
            .and_then(|p| p.includedir.as_deref())
            .map(|dir| Path::new(dir).join(&self.name).join("types"))
    }

    /// Definitions of every type this typekit exports.
    pub fn self_types(&self) -> Vec<&TypeDef> {
        self.typelist
            .all
            .iter()
            .filter_map(|n| self.registry.get(n).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::types::TypeDef;

    #[test]
    fn parse_partitions_interface_and_internal() {
        let list = Typelist::parse("/A\n/B 0\n/C 1").unwrap();
        assert_eq!(list.all.len(), 3);
        assert!(list.interface.contains(&TypeName::new("/A")));
        assert!(!list.interface.contains(&TypeName::new("/B")));
        assert!(list.interface.contains(&TypeName::new("/C")));
    }

    #[test]
    fn parse_accepts_names_with_spaces() {
        let list = Typelist::parse("/unsigned char[8] 0\n/string\n\n").unwrap();
        assert!(list.all.contains(&TypeName::new("/unsigned char[8]")));
        assert_eq!(list.interface.len(), 1);
    }

    #[test]
    fn parse_rejects_two_flag_groups() {
        let err = Typelist::parse("/A\n/B 1 0").unwrap_err();
        assert!(matches!(err, DomainError::MalformedDeclaration { ref line, .. } if line == "/B 1 0"));
    }

    #[test]
    fn to_text_preserves_partition() {
        let list = Typelist::parse("/C 1\n/A\n/B 0").unwrap();
        let text = list.to_text();
        assert_eq!(text, "/A\n/B 0\n/C\n");
        assert_eq!(Typelist::parse(&text).unwrap(), list);
    }

    fn descriptor() -> TypekitDescriptor {
        let mut registry = TypeRegistry::with_standard_types();
        registry.add(TypeDef::opaque("/base/Matrix")).unwrap();
        registry
            .add(TypeDef::compound("/wrappers/Matrix", &[("data", "/double")]))
            .unwrap();
        TypekitDescriptor {
            registry,
            opaques: vec![OpaqueEntry {
                name: "/base/Matrix".into(),
                marshal_as: "/wrappers/Matrix".into(),
                includes: "base/Matrix.hpp:wrappers/Matrix.hpp".into(),
                needs_copy: "1".into(),
            }],
        }
    }

    #[test]
    fn from_parts_loads_opaques() {
        let package = PackageInfo {
            name: "base-typekit-gnulinux".into(),
            includedir: Some(PathBuf::from("/opt/include")),
            ..Default::default()
        };
        let typekit = Typekit::from_parts(
            "base",
            Some(package),
            descriptor(),
            Typelist::parse("/base/Matrix\n/wrappers/Matrix 0").unwrap(),
        )
        .unwrap();

        let opaque = typekit.opaque_for(&TypeName::new("/base/Matrix")).unwrap();
        assert!(opaque.needs_copy);
        assert_eq!(opaque.includes.len(), 2);
        assert!(typekit.has_opaques());
        assert!(typekit.opaque_registry().contains(&TypeName::new("/base/Matrix")));
        assert_eq!(
            typekit.transport_pkg_name("corba").as_deref(),
            Some("base-transport-corba-gnulinux")
        );
        assert_eq!(
            typekit.types_dir(),
            Some(PathBuf::from("/opt/include/base/types"))
        );
        assert_eq!(typekit.self_types().len(), 2);
    }

    #[test]
    fn from_parts_rejects_unexported_interface_types() {
        let typelist = Typelist {
            all: BTreeSet::new(),
            interface: [TypeName::new("/A")].into_iter().collect(),
        };
        assert!(Typekit::from_parts("bad", None, TypekitDescriptor::default(), typelist).is_err());
    }

    #[test]
    fn rtt_typekit_derives_its_own_membership() {
        let typekit = Typekit::virtual_rtt(&TypeRegistry::with_standard_types());
        assert!(typekit.is_virtual());
        assert!(typekit.pkg_name().is_none());
        assert!(typekit.include_dirs().is_empty());
        assert!(typekit.types_dir().is_none());
        assert!(typekit.includes(&TypeName::new("/int64_t")));
        assert!(typekit.includes(&TypeName::new("/void")));
        assert!(!typekit.includes(&TypeName::new("/std/string")));
        assert!(typekit.interface_type(&TypeName::new("/double")));
        assert!(!typekit.interface_type(&TypeName::new("/int64_t")));
    }
}
