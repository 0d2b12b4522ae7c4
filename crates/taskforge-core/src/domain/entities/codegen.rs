//! Generation records: the declarative output of registering a task for
//! generation.
//!
//! Registration never writes text. Members contribute declaration,
//! construction and hook records to a [`GenerationRecords`] value, and the
//! generator renders those records into the base and user classes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::domain::{
    entities::{
        members::{Attribute, Operation, Port, Property},
        task::TaskContext,
    },
    error::DomainError,
    value_objects::{CodePlacement, Hook, RetentionPolicy, TypeName},
};

// ── CodeSlot ─────────────────────────────────────────────────────────────────

/// A piece of code, either literal or produced when rendered.
#[derive(Clone)]
pub enum CodeSlot {
    Literal(String),
    Deferred(Arc<dyn Fn() -> String + Send + Sync>),
}

impl CodeSlot {
    pub fn deferred(f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self::Deferred(Arc::new(f))
    }

    pub fn render(&self) -> String {
        match self {
            Self::Literal(code) => code.clone(),
            Self::Deferred(f) => f(),
        }
    }

    /// Render with every line prefixed by `width` spaces.
    pub fn render_indented(&self, width: usize) -> String {
        indent(&self.render(), width)
    }
}

impl fmt::Debug for CodeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(code) => f.debug_tuple("Literal").field(code).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<&str> for CodeSlot {
    fn from(code: &str) -> Self {
        Self::Literal(code.to_string())
    }
}

impl From<String> for CodeSlot {
    fn from(code: String) -> Self {
        Self::Literal(code)
    }
}

pub(crate) fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escape text for use inside a C++ string literal.
pub(crate) fn cxx_quote(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn comment_block(lines: &[String]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }
    let mut out = String::from("/**");
    for line in lines {
        out.push_str("\n * ");
        out.push_str(line);
    }
    out.push_str("\n */");
    Some(out)
}

// ── Generated members and methods ────────────────────────────────────────────

/// A class member of a generated class, with the code that sets it up.
#[derive(Debug, Clone)]
pub struct GeneratedMember {
    pub kind: String,
    pub name: String,
    /// C++ type of the field. Construction-only records have none.
    pub type_sig: Option<String>,
    pub doc: Vec<String>,
    pub initializer: Option<CodeSlot>,
    pub constructor: Option<CodeSlot>,
    pub destructor: Option<CodeSlot>,
}

impl GeneratedMember {
    pub fn new(kind: impl Into<String>, name: impl Into<String>, type_sig: Option<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            type_sig,
            doc: Vec::new(),
            initializer: None,
            constructor: None,
            destructor: None,
        }
    }

    pub fn initializer(&mut self, code: impl Into<CodeSlot>) -> &mut Self {
        self.initializer = Some(code.into());
        self
    }

    pub fn constructor(&mut self, code: impl Into<CodeSlot>) -> &mut Self {
        self.constructor = Some(code.into());
        self
    }

    pub fn destructor(&mut self, code: impl Into<CodeSlot>) -> &mut Self {
        self.destructor = Some(code.into());
        self
    }

    pub fn doc(&mut self, line: impl Into<String>) -> &mut Self {
        self.doc.push(line.into());
        self
    }

    /// Field declaration, `None` for construction-only records.
    pub fn declaration(&self) -> Option<String> {
        let ty = self.type_sig.as_ref()?;
        let decl = format!("{} {};", ty, self.name);
        Some(match comment_block(&self.doc) {
            Some(doc) => format!("{}\n{}", doc, decl),
            None => decl,
        })
    }
}

/// A method declared on the base or the user class.
#[derive(Debug, Clone)]
pub struct GeneratedMethod {
    pub in_base: bool,
    pub return_type: String,
    pub name: String,
    pub signature: String,
    pub doc: Vec<String>,
    pub body: Option<CodeSlot>,
}

impl GeneratedMethod {
    pub fn doc(&mut self, line: impl Into<String>) -> &mut Self {
        self.doc.push(line.into());
        self
    }

    pub fn body(&mut self, code: impl Into<CodeSlot>) -> &mut Self {
        self.body = Some(code.into());
        self
    }

    /// `virtual R name(sig);`, pure when there is no body.
    pub fn declaration(&self) -> String {
        let mut decl = format!("virtual {} {}({})", self.return_type, self.name, self.signature);
        if self.body.is_none() {
            decl.push_str(" = 0");
        }
        decl.push(';');
        match comment_block(&self.doc) {
            Some(doc) => format!("{}\n{}", doc, decl),
            None => decl,
        }
    }

    /// Out-of-class definition for a method with a body.
    pub fn definition(&self, basename: &str) -> Option<String> {
        let body = self.body.as_ref()?;
        let class = if self.in_base {
            format!("{}Base", basename)
        } else {
            basename.to_string()
        };
        Some(format!(
            "{} {}::{}({})\n{{\n{}\n}}",
            self.return_type,
            class,
            self.name,
            self.signature,
            body.render()
        ))
    }
}

// ── GenerationRecords ────────────────────────────────────────────────────────

/// Everything a task contributes to its generated classes.
#[derive(Debug, Clone, Default)]
pub struct GenerationRecords {
    base_members: Vec<GeneratedMember>,
    user_members: Vec<GeneratedMember>,
    base_methods: Vec<GeneratedMethod>,
    user_methods: Vec<GeneratedMethod>,
    base_hook_code: BTreeMap<Hook, Vec<CodeSlot>>,
    base_header_code: Vec<(CodePlacement, CodeSlot)>,
    base_implementation_code: Vec<(CodePlacement, CodeSlot)>,
    inherited_base_methods: BTreeSet<String>,
}

impl GenerationRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with the base method names visible from the superclass chain.
    pub fn with_inherited_methods(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.inherited_base_methods.extend(names);
        self
    }

    pub fn add_base_member(
        &mut self,
        kind: &str,
        name: &str,
        type_sig: Option<String>,
    ) -> Result<&mut GeneratedMember, DomainError> {
        push_member(&mut self.base_members, kind, name, type_sig)
    }

    pub fn add_user_member(
        &mut self,
        kind: &str,
        name: &str,
        type_sig: Option<String>,
    ) -> Result<&mut GeneratedMember, DomainError> {
        push_member(&mut self.user_members, kind, name, type_sig)
    }

    /// Constructor-body code not attached to a field.
    pub fn add_base_construction(
        &mut self,
        kind: &str,
        name: &str,
        code: impl Into<CodeSlot>,
    ) -> Result<(), DomainError> {
        self.add_base_member(kind, name, None)?.constructor(code);
        Ok(())
    }

    pub fn add_base_destruction(
        &mut self,
        kind: &str,
        name: &str,
        code: impl Into<CodeSlot>,
    ) -> Result<(), DomainError> {
        self.add_base_member(kind, name, None)?.destructor(code);
        Ok(())
    }

    pub fn add_base_method(
        &mut self,
        return_type: &str,
        name: &str,
        signature: &str,
    ) -> Result<&mut GeneratedMethod, DomainError> {
        push_method(&mut self.base_methods, true, return_type, name, signature)
    }

    /// True if `name` is a base method here or anywhere up the chain.
    pub fn has_base_method(&self, name: &str) -> bool {
        self.inherited_base_methods.contains(name) || self.base_methods.iter().any(|m| m.name == name)
    }

    /// Declare a method the user class implements.
    ///
    /// Unless the chain already has a base method of that name, a pure
    /// virtual declaration is added to the base class as well.
    pub fn add_user_method(
        &mut self,
        task_name: &str,
        return_type: &str,
        name: &str,
        signature: &str,
    ) -> Result<&mut GeneratedMethod, DomainError> {
        if !self.has_base_method(name) {
            self.add_base_method(return_type, name, signature)?
                .doc("If the compiler issues an error at this point, it is probably that")
                .doc(format!(
                    "you forgot to add the corresponding method to the {} class.",
                    task_name
                ));
        }
        push_method(&mut self.user_methods, false, return_type, name, signature)
    }

    pub fn in_base_hook(&mut self, hook: Hook, code: impl Into<CodeSlot>) {
        self.base_hook_code.entry(hook).or_default().push(code.into());
    }

    pub fn add_base_header_code(&mut self, code: impl Into<CodeSlot>, placement: CodePlacement) {
        self.base_header_code.push((placement, code.into()));
    }

    pub fn add_base_implementation_code(
        &mut self,
        code: impl Into<CodeSlot>,
        placement: CodePlacement,
    ) {
        self.base_implementation_code.push((placement, code.into()));
    }

    /// Append every record of `other`, keeping the duplicate checks.
    pub fn extend(&mut self, other: &GenerationRecords) -> Result<(), DomainError> {
        for m in &other.base_members {
            let added = self.add_base_member(&m.kind, &m.name, m.type_sig.clone())?;
            *added = m.clone();
        }
        for m in &other.user_members {
            let added = self.add_user_member(&m.kind, &m.name, m.type_sig.clone())?;
            *added = m.clone();
        }
        for m in &other.base_methods {
            let added = self.add_base_method(&m.return_type, &m.name, &m.signature)?;
            *added = m.clone();
        }
        for m in &other.user_methods {
            let added = push_method(&mut self.user_methods, false, &m.return_type, &m.name, &m.signature)?;
            *added = m.clone();
        }
        for (hook, code) in &other.base_hook_code {
            self.base_hook_code
                .entry(*hook)
                .or_default()
                .extend(code.iter().cloned());
        }
        self.base_header_code.extend(other.base_header_code.iter().cloned());
        self.base_implementation_code
            .extend(other.base_implementation_code.iter().cloned());
        Ok(())
    }

    pub fn base_members(&self) -> &[GeneratedMember] {
        &self.base_members
    }

    pub fn user_members(&self) -> &[GeneratedMember] {
        &self.user_members
    }

    pub fn base_methods(&self) -> &[GeneratedMethod] {
        &self.base_methods
    }

    pub fn user_methods(&self) -> &[GeneratedMethod] {
        &self.user_methods
    }

    pub fn hook_code(&self, hook: Hook) -> &[CodeSlot] {
        self.base_hook_code.get(&hook).map_or(&[], Vec::as_slice)
    }

    pub fn base_header_code(&self, placement: CodePlacement) -> impl Iterator<Item = &CodeSlot> {
        self.base_header_code
            .iter()
            .filter(move |(p, _)| *p == placement)
            .map(|(_, c)| c)
    }

    pub fn base_implementation_code(
        &self,
        placement: CodePlacement,
    ) -> impl Iterator<Item = &CodeSlot> {
        self.base_implementation_code
            .iter()
            .filter(move |(p, _)| *p == placement)
            .map(|(_, c)| c)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.base_methods.iter().map(|m| m.name.as_str())
    }
}

fn push_member<'a>(
    set: &'a mut Vec<GeneratedMember>,
    kind: &str,
    name: &str,
    type_sig: Option<String>,
) -> Result<&'a mut GeneratedMember, DomainError> {
    if set.iter().any(|m| m.kind == kind && m.name == name) {
        return Err(DomainError::DuplicateGeneratedMember {
            kind: kind.to_string(),
            name: name.to_string(),
        });
    }
    set.push(GeneratedMember::new(kind, name, type_sig));
    let last = set.len() - 1;
    Ok(&mut set[last])
}

fn push_method<'a>(
    set: &'a mut Vec<GeneratedMethod>,
    in_base: bool,
    return_type: &str,
    name: &str,
    signature: &str,
) -> Result<&'a mut GeneratedMethod, DomainError> {
    if set.iter().any(|m| m.name == name) {
        return Err(DomainError::DuplicateMethod {
            name: name.to_string(),
        });
    }
    set.push(GeneratedMethod {
        in_base,
        return_type: return_type.to_string(),
        name: name.to_string(),
        signature: signature.to_string(),
        doc: Vec::new(),
        body: None,
    });
    let last = set.len() - 1;
    Ok(&mut set[last])
}

// ── Generatable ──────────────────────────────────────────────────────────────

/// Generation behaviour of one kind of interface member.
pub trait Generatable {
    /// Types the member needs at compile time.
    fn used_types(&self) -> Vec<&TypeName>;

    /// Field declarations, with initializer and constructor code.
    fn declaration_records(&self, task: &TaskContext) -> Vec<GeneratedMember>;

    /// Constructor code not attached to a field.
    fn construction_records(&self) -> Vec<GeneratedMember> {
        Vec::new()
    }

    /// Statements injected into lifecycle hooks.
    fn hook_records(&self) -> Vec<(Hook, CodeSlot)> {
        Vec::new()
    }

    /// Methods added to the base or user class.
    fn register_methods(
        &self,
        _task: &TaskContext,
        _records: &mut GenerationRecords,
    ) -> Result<(), DomainError> {
        Ok(())
    }

    fn register_for_generation(
        &self,
        task: &TaskContext,
        records: &mut GenerationRecords,
    ) -> Result<(), DomainError> {
        for member in self
            .declaration_records(task)
            .into_iter()
            .chain(self.construction_records())
        {
            let slot = records.add_base_member(&member.kind, &member.name, member.type_sig.clone())?;
            *slot = member;
        }
        for (hook, code) in self.hook_records() {
            records.in_base_hook(hook, code);
        }
        self.register_methods(task, records)
    }
}

impl Generatable for Property {
    fn used_types(&self) -> Vec<&TypeName> {
        vec![&self.type_ref.name]
    }

    fn declaration_records(&self, _task: &TaskContext) -> Vec<GeneratedMember> {
        let field = format!("_{}", self.name);
        let mut constructor = Vec::new();
        if let Some(value) = &self.default_value {
            constructor.push(format!("{}.set({});", field, value));
        }
        constructor.push(format!("properties()->addProperty( {} );", field));

        let mut member = GeneratedMember::new(
            "property",
            &field,
            Some(format!("RTT::Property< {} >", self.type_ref.cxx_name())),
        );
        member
            .initializer(format!(
                "{}(\"{}\", \"{}\")",
                field,
                self.name,
                cxx_quote(self.doc.as_deref().unwrap_or_default())
            ))
            .constructor(constructor.join("\n"));
        vec![member]
    }
}

impl Generatable for Attribute {
    fn used_types(&self) -> Vec<&TypeName> {
        vec![&self.type_ref.name]
    }

    fn declaration_records(&self, _task: &TaskContext) -> Vec<GeneratedMember> {
        let field = format!("_{}", self.name);
        let mut constructor = Vec::new();
        if let Some(value) = &self.default_value {
            constructor.push(format!("{}.set({});", field, value));
        }
        constructor.push(format!("attributes()->addAttribute( {} );", field));

        let mut member = GeneratedMember::new(
            "attribute",
            &field,
            Some(format!("RTT::Attribute< {} >", self.type_ref.cxx_name())),
        );
        member
            .initializer(format!("{}(\"{}\")", field, self.name))
            .constructor(constructor.join("\n"));
        vec![member]
    }
}

fn retention_statements(field: &str, policy: RetentionPolicy) -> String {
    format!(
        "{field}.keepLastWrittenValue({});\n{field}.keepNextWrittenValue({});",
        policy.keep_last_written(),
        policy.keep_next_written(),
    )
}

impl Generatable for Port {
    fn used_types(&self) -> Vec<&TypeName> {
        self.type_name().into_iter().collect()
    }

    /// Dynamic port templates have no field of their own.
    fn declaration_records(&self, _task: &TaskContext) -> Vec<GeneratedMember> {
        let Some(type_ref) = self.type_ref.as_ref().filter(|_| !self.dynamic) else {
            return Vec::new();
        };
        let field = format!("_{}", self.name);
        let add = if self.is_input() && self.event_triggered {
            "addEventPort"
        } else {
            "addPort"
        };
        let mut constructor = format!("ports()->{}({})", add, field);
        if let Some(doc) = &self.doc {
            constructor.push_str(&format!("\n  .doc(\"{}\")", cxx_quote(doc)));
        }
        constructor.push(';');

        let kind = if self.is_input() {
            "input_port_declaration"
        } else {
            "output_port_declaration"
        };
        let mut member = GeneratedMember::new(
            kind,
            &field,
            Some(format!(
                "{}< {} >",
                self.direction.framework_class(),
                type_ref.cxx_name()
            )),
        );
        member
            .initializer(format!("{}(\"{}\")", field, self.name))
            .constructor(constructor);
        vec![member]
    }

    fn construction_records(&self) -> Vec<GeneratedMember> {
        if self.dynamic || self.is_input() {
            return Vec::new();
        }
        let field = format!("_{}", self.name);
        let mut member = GeneratedMember::new("output_port", &field, None);
        member.constructor(retention_statements(&field, self.retention));
        vec![member]
    }

    fn hook_records(&self) -> Vec<(Hook, CodeSlot)> {
        if self.dynamic || !self.is_input() || !self.clear_on_start {
            return Vec::new();
        }
        vec![(Hook::Start, format!("_{}.clear();", self.name).into())]
    }
}

impl Generatable for Operation {
    fn used_types(&self) -> Vec<&TypeName> {
        self.return_type
            .iter()
            .map(|t| &t.name)
            .chain(self.arguments.iter().map(|a| &a.type_ref.name))
            .collect()
    }

    fn declaration_records(&self, task: &TaskContext) -> Vec<GeneratedMember> {
        let field = format!("_{}", self.name);
        let mut constructor = format!(
            "provides()->addOperation( {})\n    .doc(\"{}\")",
            field,
            cxx_quote(self.doc.as_deref().unwrap_or_default())
        );
        for arg in &self.arguments {
            constructor.push_str(&format!(
                "\n    .arg(\"{}\", \"{}\")",
                arg.name,
                cxx_quote(&arg.doc)
            ));
        }
        constructor.push(';');

        let mut member = GeneratedMember::new(
            "operation",
            &field,
            Some(format!("RTT::Operation< {} >", self.signature(false))),
        );
        member
            .initializer(format!(
                "{}(\"{}\", &{}Base::{}, this, {})",
                field,
                self.name,
                task.basename(),
                self.method_name,
                self.thread.cxx()
            ))
            .constructor(constructor);
        vec![member]
    }

    fn register_methods(
        &self,
        task: &TaskContext,
        records: &mut GenerationRecords,
    ) -> Result<(), DomainError> {
        if self.hidden && self.body.is_none() {
            return Err(DomainError::MissingBody {
                task: task.name().to_string(),
                operation: self.name.clone(),
            });
        }
        let body = match (&self.body, &self.return_type) {
            (Some(body), _) => body.clone(),
            (None, Some(ret)) => format!("    return {}();", ret.cxx_name()),
            (None, None) => String::new(),
        };

        let return_type = self.return_cxx();
        let signature = self.argument_signature(true);
        let method = if self.hidden {
            records.add_base_method(&return_type, &self.method_name, &signature)?
        } else {
            records.add_user_method(task.name(), &return_type, &self.method_name, &signature)?
        };
        method
            .doc(format!("Handler for the {} operation", self.method_name))
            .body(body);
        Ok(())
    }
}

// ── Extensions and handlers ──────────────────────────────────────────────────

/// A plugin attached to a task that contributes its own records.
pub trait TaskExtension: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn used_types(&self) -> Vec<TypeName> {
        Vec::new()
    }

    fn register_for_generation(
        &self,
        task: &TaskContext,
        records: &mut GenerationRecords,
    ) -> Result<(), DomainError>;
}

type HandlerFn = dyn Fn(&TaskContext, &mut GenerationRecords) -> Result<(), DomainError> + Send + Sync;

/// Late-bound callback run after members and extensions registered.
#[derive(Clone)]
pub struct GenerationHandler(Arc<HandlerFn>);

impl GenerationHandler {
    pub fn new(
        f: impl Fn(&TaskContext, &mut GenerationRecords) -> Result<(), DomainError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(
        &self,
        task: &TaskContext,
        records: &mut GenerationRecords,
    ) -> Result<(), DomainError> {
        (self.0)(task, records)
    }
}

impl fmt::Debug for GenerationHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GenerationHandler(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_slot_renders_literal_and_deferred() {
        assert_eq!(CodeSlot::from("x = 1;").render(), "x = 1;");
        let slot = CodeSlot::deferred(|| format!("y = {};", 2));
        assert_eq!(slot.render(), "y = 2;");
        assert_eq!(CodeSlot::from("a;\nb;").render_indented(4), "    a;\n    b;");
    }

    #[test]
    fn duplicate_member_kind_and_name_rejected() {
        let mut records = GenerationRecords::new();
        records.add_base_member("property", "_gain", None).unwrap();
        records.add_base_member("attribute", "_gain", None).unwrap();
        assert!(matches!(
            records.add_base_member("property", "_gain", None),
            Err(DomainError::DuplicateGeneratedMember { .. })
        ));
    }

    #[test]
    fn user_method_adds_pure_virtual_once() {
        let mut records = GenerationRecords::new();
        records
            .add_user_method("demo::Task", "void", "reset", "")
            .unwrap()
            .body("");
        assert_eq!(records.base_methods().len(), 1);
        assert!(records.base_methods()[0].declaration().ends_with("virtual void reset() = 0;"));
        assert_eq!(records.user_methods().len(), 1);

        let mut derived = GenerationRecords::new().with_inherited_methods(["reset".to_string()]);
        derived.add_user_method("demo::Sub", "void", "reset", "").unwrap();
        assert!(derived.base_methods().is_empty());
    }

    #[test]
    fn duplicate_method_at_same_level_rejected() {
        let mut records = GenerationRecords::new();
        records.add_base_method("int", "count", "").unwrap();
        assert!(matches!(
            records.add_base_method("int", "count", ""),
            Err(DomainError::DuplicateMethod { .. })
        ));
    }

    #[test]
    fn method_definition_qualifies_class() {
        let mut records = GenerationRecords::new();
        records
            .add_base_method("std::string", "getModelName", "")
            .unwrap()
            .body("    return \"demo::Task\";");
        let def = records.base_methods()[0].definition("Task").unwrap();
        assert!(def.starts_with("std::string TaskBase::getModelName()\n{\n"));
    }

    #[test]
    fn retention_maps_to_flags() {
        assert_eq!(
            retention_statements("_out", RetentionPolicy::OnlyIfUnread),
            "_out.keepLastWrittenValue(false);\n_out.keepNextWrittenValue(true);"
        );
        assert_eq!(
            retention_statements("_out", RetentionPolicy::Always),
            "_out.keepLastWrittenValue(true);\n_out.keepNextWrittenValue(false);"
        );
    }
}
