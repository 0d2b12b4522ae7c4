use crate::domain::{entities::types::TypeDef, error::DomainError};

/// Numeric types the framework can carry as standalone values.
pub const NATIVE_NUMERIC_TYPES: &[&str] = &[
    "/bool",
    "/char",
    "/int32_t",
    "/uint32_t",
    "/int64_t",
    "/uint64_t",
    "/float",
    "/double",
];

/// Centralized domain validation.
///
/// Rules that need more than one entity to check live here, not scattered
/// across entities.
pub struct DomainValidator;

impl DomainValidator {
    /// Check a type used directly as a port, property or attribute type.
    ///
    /// Arrays are only legal inside structures, and only the native numeric
    /// types may be used standalone.
    pub fn validate_toplevel_type(def: &TypeDef) -> Result<(), DomainError> {
        if def.is_array() {
            return Err(DomainError::IllegalType {
                name: def.name().to_string(),
                reason: "array types can be used only in a structure".into(),
            });
        }
        if def.is_numeric() && !NATIVE_NUMERIC_TYPES.contains(&def.name().as_str()) {
            return Err(DomainError::IllegalType {
                name: def.name().to_string(),
                reason: format!("{} cannot be used as a toplevel type", def.name()),
            });
        }
        Ok(())
    }

    /// Member and task names must be C++ identifiers.
    pub fn validate_identifier(name: &str) -> Result<(), DomainError> {
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(DomainError::InvalidName {
                name: name.to_string(),
                reason: "must start with a letter or '_' and contain only letters, digits and '_'"
                    .into(),
            });
        }
        Ok(())
    }
}
