//! Declarative project description.
//!
//! This is the serde shape of a project file. Adapters read it from TOML;
//! the project loader turns it into a [`ProjectModel`](super::ProjectModel)
//! through the same builder API plugins use.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::RetentionPolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectDecl {
    pub name: String,
    /// Name of the project's own typekit, loaded like an import.
    #[serde(default)]
    pub typekit: Option<String>,
    #[serde(default)]
    pub using_typekit: Vec<String>,
    #[serde(default)]
    pub using_task_library: Vec<String>,
    #[serde(default, rename = "task")]
    pub tasks: Vec<TaskDecl>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskDecl {
    pub name: String,
    #[serde(default)]
    pub subclasses: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub needs_configuration: bool,
    #[serde(default)]
    pub fixed_initial_state: bool,
    #[serde(default, rename = "input_port")]
    pub input_ports: Vec<PortDecl>,
    #[serde(default, rename = "output_port")]
    pub output_ports: Vec<PortDecl>,
    #[serde(default, rename = "dynamic_input_port")]
    pub dynamic_input_ports: Vec<DynamicPortDecl>,
    #[serde(default, rename = "dynamic_output_port")]
    pub dynamic_output_ports: Vec<DynamicPortDecl>,
    #[serde(default, rename = "property")]
    pub properties: Vec<ValueDecl>,
    #[serde(default, rename = "attribute")]
    pub attributes: Vec<ValueDecl>,
    #[serde(default, rename = "operation")]
    pub operations: Vec<OperationDecl>,
    /// Hook name → statements added to the base class hook.
    #[serde(default)]
    pub hooks: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub header_code: Vec<CodeDecl>,
    #[serde(default)]
    pub implementation_code: Vec<CodeDecl>,
    /// Legacy forms, rejected when applied.
    #[serde(default, rename = "method")]
    pub methods: Vec<LegacyDecl>,
    #[serde(default, rename = "command")]
    pub commands: Vec<LegacyDecl>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub doc: Option<String>,
    /// Input ports: wake the component when data arrives.
    #[serde(default)]
    pub event: bool,
    /// Input ports: clear the port when the component starts.
    #[serde(default = "default_true")]
    pub clear_on_start: bool,
    /// Output ports.
    #[serde(default)]
    pub keep_last_written_value: RetentionPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DynamicPortDecl {
    pub name: String,
    /// Omitted for ports accepting any type.
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationDecl {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub returns: Option<String>,
    #[serde(default, rename = "argument")]
    pub arguments: Vec<ArgumentDecl>,
    #[serde(default)]
    pub caller_thread: bool,
    #[serde(default)]
    pub method_name: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArgumentDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub doc: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeDecl {
    pub code: String,
    #[serde(default)]
    pub after_class: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyDecl {
    pub name: String,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_project_file() {
        let text = r#"
            name = "demo"
            using_typekit = ["base"]

            [[task]]
            name = "Driver"
            needs_configuration = true

            [[task.input_port]]
            name = "cmd"
            type = "/base/Time"
            event = true

            [[task.output_port]]
            name = "state"
            type = "/double"
            keep_last_written_value = "always"

            [[task.operation]]
            name = "Reset"
            returns = "/bool"

            [[task.operation.argument]]
            name = "hard"
            type = "/bool"

            [task.hooks]
            update = ["tick();"]
        "#;
        let decl: ProjectDecl = toml::from_str(text).unwrap();
        assert_eq!(decl.name, "demo");
        let task = &decl.tasks[0];
        assert!(task.input_ports[0].event);
        assert!(task.input_ports[0].clear_on_start);
        assert_eq!(
            task.output_ports[0].keep_last_written_value,
            RetentionPolicy::Always
        );
        assert_eq!(task.operations[0].arguments[0].name, "hard");
        assert_eq!(task.hooks["update"], vec!["tick();".to_string()]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let text = "name = \"demo\"\nbogus = 1\n";
        assert!(toml::from_str::<ProjectDecl>(text).is_err());
    }
}
