//! Type registry model.
//!
//! The registry is the sole owner of type definitions. Every other entity
//! refers to types by [`TypeName`] and looks them up here. Registries are
//! built by the descriptor parser (an adapter) and merged into a project
//! view as typekits get imported.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{error::DomainError, value_objects::TypeName};

/// Representation of a numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericCategory {
    Signed,
    Unsigned,
    Float,
}

/// A field of a compound type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub type_name: TypeName,
}

/// Structural kind of a registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeCategory {
    Numeric { category: NumericCategory, size: u8 },
    /// `void` and other value-less types.
    Null,
    Array { element: TypeName, length: usize },
    Compound { fields: Vec<Field> },
    Enum { symbols: Vec<(String, i64)> },
    Container { kind: String, element: TypeName },
    Alias { target: TypeName },
    /// Not introspectable; needs a marshalling type at interface boundaries.
    Opaque,
}

/// A type definition owned by a [`TypeRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    name: TypeName,
    category: TypeCategory,
}

impl TypeDef {
    pub fn new(name: TypeName, category: TypeCategory) -> Self {
        Self { name, category }
    }

    pub fn numeric(name: &str, category: NumericCategory, size: u8) -> Self {
        Self::new(TypeName::new(name), TypeCategory::Numeric { category, size })
    }

    pub fn compound(name: &str, fields: &[(&str, &str)]) -> Self {
        let fields = fields
            .iter()
            .map(|(n, t)| Field {
                name: (*n).to_string(),
                type_name: TypeName::new(t),
            })
            .collect();
        Self::new(TypeName::new(name), TypeCategory::Compound { fields })
    }

    pub fn opaque(name: &str) -> Self {
        Self::new(TypeName::new(name), TypeCategory::Opaque)
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }

    pub fn category(&self) -> &TypeCategory {
        &self.category
    }

    pub fn cxx_name(&self) -> String {
        self.name.cxx_name()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.category, TypeCategory::Numeric { .. })
    }

    pub fn is_null(&self) -> bool {
        matches!(self.category, TypeCategory::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self.category, TypeCategory::Array { .. })
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self.category, TypeCategory::Opaque)
    }

    /// Types this definition refers to directly.
    pub fn dependencies(&self) -> Vec<&TypeName> {
        match &self.category {
            TypeCategory::Array { element, .. } | TypeCategory::Container { element, .. } => {
                vec![element]
            }
            TypeCategory::Compound { fields } => fields.iter().map(|f| &f.type_name).collect(),
            TypeCategory::Alias { target } => vec![target],
            _ => Vec::new(),
        }
    }
}

/// Name-indexed set of type definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeRegistry {
    types: BTreeMap<TypeName, TypeDef>,
}

/// Native C++ types every registry knows about.
const STANDARD_NUMERICS: &[(&str, NumericCategory, u8)] = &[
    ("/bool", NumericCategory::Unsigned, 1),
    ("/char", NumericCategory::Signed, 1),
    ("/int8_t", NumericCategory::Signed, 1),
    ("/uint8_t", NumericCategory::Unsigned, 1),
    ("/int16_t", NumericCategory::Signed, 2),
    ("/uint16_t", NumericCategory::Unsigned, 2),
    ("/int32_t", NumericCategory::Signed, 4),
    ("/uint32_t", NumericCategory::Unsigned, 4),
    ("/int64_t", NumericCategory::Signed, 8),
    ("/uint64_t", NumericCategory::Unsigned, 8),
    ("/float", NumericCategory::Float, 4),
    ("/double", NumericCategory::Float, 8),
];

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the standard C++ types.
    pub fn with_standard_types() -> Self {
        let mut registry = Self::new();
        registry.add_standard_types();
        registry
    }

    /// Register the native numeric types, `void` and `std::string`.
    pub fn add_standard_types(&mut self) {
        for (name, category, size) in STANDARD_NUMERICS {
            self.types
                .entry(TypeName::new(name))
                .or_insert_with(|| TypeDef::numeric(name, *category, *size));
        }
        self.types
            .entry(TypeName::new("/void"))
            .or_insert_with(|| TypeDef::new(TypeName::new("/void"), TypeCategory::Null));
        self.types.entry(TypeName::new("/std/string")).or_insert_with(|| {
            TypeDef::new(
                TypeName::new("/std/string"),
                TypeCategory::Container {
                    kind: "/std/string".into(),
                    element: TypeName::new("/char"),
                },
            )
        });
    }

    /// Add a definition. Re-adding an identical definition is a no-op.
    pub fn add(&mut self, def: TypeDef) -> Result<(), DomainError> {
        match self.types.get(def.name()) {
            Some(existing) if existing != &def => Err(DomainError::ConflictingTypeDefinition {
                name: def.name().to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.types.insert(def.name().clone(), def);
                Ok(())
            }
        }
    }

    /// Look a type up by name.
    pub fn get(&self, name: &TypeName) -> Result<&TypeDef, DomainError> {
        self.types.get(name).ok_or_else(|| DomainError::TypeNotFound {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &TypeName) -> bool {
        self.types.contains_key(name)
    }

    /// Merge every definition of `other` into this registry.
    ///
    /// Fails without modifying `self` if a definition conflicts.
    pub fn merge(&mut self, other: &TypeRegistry) -> Result<(), DomainError> {
        for def in other.iter() {
            if let Some(existing) = self.types.get(def.name()) {
                if existing != def {
                    return Err(DomainError::ConflictingTypeDefinition {
                        name: def.name().to_string(),
                    });
                }
            }
        }
        for def in other.iter() {
            self.types
                .entry(def.name().clone())
                .or_insert_with(|| def.clone());
        }
        Ok(())
    }

    /// The subset of this registry needed to define `name`.
    pub fn minimal(&self, name: &TypeName) -> Result<TypeRegistry, DomainError> {
        let mut result = TypeRegistry::new();
        let mut pending = vec![name.clone()];
        while let Some(current) = pending.pop() {
            if result.contains(&current) {
                continue;
            }
            let def = self.get(&current)?;
            pending.extend(def.dependencies().into_iter().cloned());
            result.types.insert(current, def.clone());
        }
        Ok(result)
    }

    /// True if `name` is opaque or (transitively) contains an opaque type.
    pub fn contains_opaques(&self, name: &TypeName) -> bool {
        self.opaques_in(name).next().is_some()
    }

    /// Every opaque type reachable from `name`, including `name` itself.
    pub fn opaques_in(&self, name: &TypeName) -> impl Iterator<Item = TypeName> {
        let mut seen = BTreeSet::new();
        let mut found = Vec::new();
        let mut pending = vec![name.clone()];
        while let Some(current) = pending.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Ok(def) = self.get(&current) {
                if def.is_opaque() {
                    found.push(current.clone());
                }
                pending.extend(def.dependencies().into_iter().cloned());
            }
        }
        found.into_iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &TypeName> {
        self.types.keys()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TypeRegistry {
        let mut registry = TypeRegistry::with_standard_types();
        registry
            .add(TypeDef::compound("/base/Time", &[("microseconds", "/int64_t")]))
            .unwrap();
        registry.add(TypeDef::opaque("/base/Matrix")).unwrap();
        registry
            .add(TypeDef::compound(
                "/base/Pose",
                &[("time", "/base/Time"), ("cov", "/base/Matrix")],
            ))
            .unwrap();
        registry
    }

    #[test]
    fn get_reports_missing_types() {
        let registry = sample();
        assert!(registry.get(&TypeName::new("/base/Time")).is_ok());
        assert!(matches!(
            registry.get(&TypeName::new("/base/Nope")),
            Err(DomainError::TypeNotFound { .. })
        ));
    }

    #[test]
    fn add_rejects_conflicting_definitions() {
        let mut registry = sample();
        assert!(registry.add(TypeDef::opaque("/base/Matrix")).is_ok());
        assert!(registry.add(TypeDef::opaque("/base/Time")).is_err());
    }

    #[test]
    fn merge_is_all_or_nothing() {
        let mut registry = sample();
        let mut other = TypeRegistry::new();
        other.add(TypeDef::opaque("/other/Thing")).unwrap();
        other.add(TypeDef::opaque("/base/Time")).unwrap();

        assert!(registry.merge(&other).is_err());
        assert!(!registry.contains(&TypeName::new("/other/Thing")));
    }

    #[test]
    fn minimal_follows_dependencies() {
        let registry = sample();
        let minimal = registry.minimal(&TypeName::new("/base/Pose")).unwrap();
        let names: Vec<_> = minimal.names().map(|n| n.as_str().to_string()).collect();
        assert_eq!(
            names,
            vec!["/base/Matrix", "/base/Pose", "/base/Time", "/int64_t"]
        );
    }

    #[test]
    fn opaques_are_found_through_compounds() {
        let registry = sample();
        assert!(registry.contains_opaques(&TypeName::new("/base/Pose")));
        assert!(!registry.contains_opaques(&TypeName::new("/base/Time")));
        let opaques: Vec<_> = registry.opaques_in(&TypeName::new("/base/Pose")).collect();
        assert_eq!(opaques, vec![TypeName::new("/base/Matrix")]);
    }
}
