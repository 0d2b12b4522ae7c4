use thiserror::Error;

/// A declaration or generation rule was broken.
///
/// `Clone` so a failed typekit import can be reported to every task that
/// asked for it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // declaration time
    #[error("Declaration '{line}' in a typelist could not be parsed: {reason}")]
    MalformedDeclaration { line: String, reason: String },

    #[error("type '{name}' is not defined in any loaded typekit")]
    TypeNotFound { name: String },

    #[error("type '{name}' cannot be used here: {reason}")]
    IllegalType { name: String, reason: String },

    #[error("'{name}' is already used in '{owner}', cannot declare it again in '{task}'")]
    DuplicateMember {
        task: String,
        name: String,
        owner: String,
    },

    #[error("{form} declarations are no longer supported: {hint}")]
    UnsupportedOperation { form: String, hint: String },

    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("task context '{name}' is already defined")]
    DuplicateTask { name: String },

    #[error("no task context named '{name}'")]
    TaskNotFound { name: String },

    #[error("typekit '{typekit}' is inconsistent: {reason}")]
    InconsistentTypekit { typekit: String, reason: String },

    #[error("type '{name}' is defined twice with different layouts")]
    ConflictingTypeDefinition { name: String },

    #[error("unknown hook '{name}', must be one of {expected}")]
    UnknownHook { name: String, expected: String },

    #[error("invalid output path '{path}': {reason}")]
    InvalidOutputPath { path: String, reason: String },

    // generation time
    #[error("hidden operation '{operation}' of '{task}' must have a body")]
    MissingBody { task: String, operation: String },

    #[error("'{task}' is imported from a task library and cannot be generated")]
    GenerationOnImport { task: String },

    #[error("opaque type '{type_name}' used by '{task}' has no registered marshalling type")]
    MissingOpaqueDefinition { task: String, type_name: String },

    #[error("duplicate name {kind}:{name} used for a generated member")]
    DuplicateGeneratedMember { kind: String, name: String },

    #[error("there is already a method called '{name}' defined at this level")]
    DuplicateMethod { name: String },
}

impl DomainError {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MalformedDeclaration { line, .. } => vec![
                format!("Offending line: '{}'", line),
                "Each line must be '<type name>' or '<type name> <flag>'".into(),
                "Regenerate the typekit if the typelist was edited by hand".into(),
            ],
            Self::TypeNotFound { name } => vec![
                format!("'{}' is not exported by any imported typekit", name),
                "Import the typekit that defines it with using_typekit".into(),
                "Try: taskforge list to see discoverable typekits".into(),
            ],
            Self::IllegalType { name, .. } => vec![
                format!("Wrap '{}' in a structure and use the structure instead", name),
                "Toplevel types must be compounds, containers or native framework types".into(),
            ],
            Self::DuplicateMember { name, .. } => vec![
                format!("Rename '{}' so it is unique across the inheritance chain", name),
            ],
            Self::UnsupportedOperation { hint, .. } => vec![hint.clone()],
            Self::MissingBody { operation, .. } => vec![
                format!("Give the hidden operation '{}' a body", operation),
                "Or expose it to the user class so it can be overridden".into(),
            ],
            Self::GenerationOnImport { task } => vec![
                format!("'{}' comes from a task library and is only a reference", task),
                "Subclass it in this project and generate the subclass instead".into(),
            ],
            Self::MissingOpaqueDefinition { type_name, .. } => vec![
                format!("Declare a marshalling type for '{}' in its typekit", type_name),
                "Add an <opaque marshal_as=\"...\"> entry to the type descriptor".into(),
            ],
            Self::UnknownHook { expected, .. } => vec![format!("Valid hooks: {}", expected)],
            _ => vec!["See documentation for more details".into()],
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedDeclaration { .. }
            | Self::IllegalType { .. }
            | Self::DuplicateMember { .. }
            | Self::InvalidName { .. }
            | Self::DuplicateTask { .. }
            | Self::UnknownHook { .. }
            | Self::InvalidOutputPath { .. }
            | Self::DuplicateGeneratedMember { .. }
            | Self::DuplicateMethod { .. }
            | Self::MissingBody { .. } => ErrorCategory::Validation,
            Self::UnsupportedOperation { .. }
            | Self::MissingOpaqueDefinition { .. }
            | Self::ConflictingTypeDefinition { .. }
            | Self::InconsistentTypekit { .. } => ErrorCategory::Compatibility,
            Self::TypeNotFound { .. } | Self::TaskNotFound { .. } => ErrorCategory::NotFound,
            Self::GenerationOnImport { .. } => ErrorCategory::Internal,
        }
    }

    /// True for a lookup miss that an on-demand typekit import may resolve.
    pub fn is_type_miss(&self) -> bool {
        matches!(self, Self::TypeNotFound { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Compatibility,
    NotFound,
    Internal,
}
