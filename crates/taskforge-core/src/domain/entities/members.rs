//! Interface members of a task context: ports, properties, attributes and
//! operations.
//!
//! Members refer to types by name. The only registry-derived fact they carry
//! is whether the type is numeric, which decides how arguments are passed.

use crate::domain::{
    entities::types::TypeDef,
    value_objects::{PortDirection, RetentionPolicy, ThreadFlag, TypeName},
};

/// A resolved, non-owning reference to a registry type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: TypeName,
    pub numeric: bool,
}

impl TypeRef {
    pub fn cxx_name(&self) -> String {
        self.name.cxx_name()
    }
}

impl From<&TypeDef> for TypeRef {
    fn from(def: &TypeDef) -> Self {
        Self {
            name: def.name().clone(),
            numeric: def.is_numeric(),
        }
    }
}

// ── Ports ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub direction: PortDirection,
    /// `None` for type-erased dynamic ports.
    pub type_ref: Option<TypeRef>,
    pub doc: Option<String>,
    pub dynamic: bool,
    /// Input ports only: new samples wake the component up.
    pub event_triggered: bool,
    /// Output ports only.
    pub retention: RetentionPolicy,
    /// Input ports only: emit `clear()` in the start hook.
    pub clear_on_start: bool,
}

impl Port {
    pub fn new(name: impl Into<String>, direction: PortDirection, type_ref: Option<TypeRef>) -> Self {
        Self {
            name: name.into(),
            direction,
            type_ref,
            doc: None,
            dynamic: false,
            event_triggered: false,
            retention: RetentionPolicy::default(),
            clear_on_start: true,
        }
    }

    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }

    /// Turn a dynamic port template into a concrete port called `name`.
    pub fn instantiate(&self, name: impl Into<String>) -> Port {
        Port {
            name: name.into(),
            dynamic: false,
            ..self.clone()
        }
    }

    pub fn type_name(&self) -> Option<&TypeName> {
        self.type_ref.as_ref().map(|t| &t.name)
    }
}

// ── Properties and attributes ────────────────────────────────────────────────

/// A configuration value, changed while the component is stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub type_ref: TypeRef,
    pub doc: Option<String>,
    /// C++ expression used to initialize the value.
    pub default_value: Option<String>,
}

/// A runtime value, readable and writable at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub type_ref: TypeRef,
    pub doc: Option<String>,
    pub default_value: Option<String>,
}

// ── Operations ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    pub type_ref: TypeRef,
    pub doc: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub method_name: String,
    pub arguments: Vec<Argument>,
    pub return_type: Option<TypeRef>,
    pub thread: ThreadFlag,
    pub body: Option<String>,
    /// Hidden operations are implemented in the base class and never
    /// exposed to the user class.
    pub hidden: bool,
    pub doc: Option<String>,
}

impl Operation {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            method_name: default_method_name(&name),
            name,
            arguments: Vec::new(),
            return_type: None,
            thread: ThreadFlag::default(),
            body: None,
            hidden: false,
            doc: None,
        }
    }

    pub fn runs_in_caller_thread(&self) -> bool {
        self.thread == ThreadFlag::ClientThread
    }

    pub fn return_cxx(&self) -> String {
        self.return_type
            .as_ref()
            .map_or_else(|| "void".to_string(), TypeRef::cxx_name)
    }

    /// C++ argument list, with `const &` added for non-numeric types.
    pub fn argument_signature(&self, with_names: bool) -> String {
        self.arguments
            .iter()
            .map(|arg| {
                let cxx = arg.type_ref.cxx_name();
                let ty = if arg.type_ref.numeric {
                    cxx
                } else {
                    format!("{} const &", cxx)
                };
                if with_names {
                    format!("{} {}", ty, arg.name)
                } else {
                    ty
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Function type as used by `RTT::Operation<>` (`R(A const &, B)`).
    pub fn signature(&self, with_names: bool) -> String {
        format!("{}({})", self.return_cxx(), self.argument_signature(with_names))
    }
}

/// `MyOperation` → `myOperation`.
fn default_method_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(name: &str) -> TypeRef {
        TypeRef {
            name: TypeName::new(name),
            numeric: true,
        }
    }

    fn compound(name: &str) -> TypeRef {
        TypeRef {
            name: TypeName::new(name),
            numeric: false,
        }
    }

    #[test]
    fn method_name_lowercases_first_letter() {
        assert_eq!(Operation::new("SetTarget").method_name, "setTarget");
        assert_eq!(Operation::new("reset").method_name, "reset");
    }

    #[test]
    fn signature_passes_compounds_by_const_ref() {
        let mut op = Operation::new("move");
        op.return_type = Some(numeric("/bool"));
        op.arguments = vec![
            Argument {
                name: "pose".into(),
                type_ref: compound("/base/Pose"),
                doc: "target".into(),
            },
            Argument {
                name: "speed".into(),
                type_ref: numeric("/double"),
                doc: String::new(),
            },
        ];
        assert_eq!(op.signature(false), "bool(base::Pose const &, double)");
        assert_eq!(
            op.argument_signature(true),
            "base::Pose const & pose, double speed"
        );
    }

    #[test]
    fn void_operations() {
        let op = Operation::new("trigger");
        assert_eq!(op.signature(false), "void()");
    }

    #[test]
    fn instantiate_produces_concrete_port() {
        let mut template = Port::new("samples", PortDirection::Output, None);
        template.dynamic = true;
        let port = template.instantiate("samples_left");
        assert_eq!(port.name, "samples_left");
        assert!(!port.dynamic);
        assert!(template.dynamic);
    }
}
