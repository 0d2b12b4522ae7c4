//! Built-in task templates with flat variable substitution.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use taskforge_core::{
    application::{ApplicationError, ports::TemplateRenderer},
    domain::{RenderContext, Segment, TemplateId},
    error::ForgeResult,
};

const TASK_BASE_HEADER: &str = include_str!("../../templates/TaskBase.hpp");
const TASK_BASE_SOURCE: &str = include_str!("../../templates/TaskBase.cpp");
const TASK_HEADER: &str = include_str!("../../templates/Task.hpp");
const TASK_SOURCE: &str = include_str!("../../templates/Task.cpp");

/// The shipped text of a template.
pub fn builtin_template(id: TemplateId) -> &'static str {
    match id {
        TemplateId::TaskBaseHeader => TASK_BASE_HEADER,
        TemplateId::TaskBaseSource => TASK_BASE_SOURCE,
        TemplateId::TaskHeader => TASK_HEADER,
        TemplateId::TaskSource => TASK_SOURCE,
    }
}

/// Renders the built-in templates, or user-provided replacements.
///
/// Every `{{VARIABLE}}` of the chosen template must be bound by the render
/// context; an unbound one fails the render instead of leaking into the
/// generated code.
#[derive(Debug, Clone, Default)]
pub struct BuiltinRenderer {
    overrides: HashMap<TemplateId, String>,
}

impl BuiltinRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the templates found directly in `dir` in place of the built-in
    /// ones. Files are matched by template name (`TaskBase.hpp`, ...);
    /// anything else is ignored.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn with_override_dir(dir: &Path) -> ForgeResult<Self> {
        if !dir.is_dir() {
            return Err(ApplicationError::TemplateNotFound {
                name: dir.display().to_string(),
            }
            .into());
        }

        let mut overrides = HashMap::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| ApplicationError::FilesystemError {
                path: dir.to_path_buf(),
                reason: format!("directory walk error: {}", e),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<TemplateId>().ok())
            else {
                warn!(file = %entry.path().display(), "Not a task template, ignoring");
                continue;
            };
            let text = fs::read_to_string(entry.path()).map_err(|e| {
                ApplicationError::FilesystemError {
                    path: entry.path().to_path_buf(),
                    reason: format!("Failed to read template: {}", e),
                }
            })?;
            debug!(template = %id, "Template overridden");
            overrides.insert(id, text);
        }
        Ok(Self { overrides })
    }

    pub fn is_overridden(&self, id: TemplateId) -> bool {
        self.overrides.contains_key(&id)
    }

    fn template(&self, id: TemplateId) -> &str {
        self.overrides
            .get(&id)
            .map_or_else(|| builtin_template(id), String::as_str)
    }
}

impl TemplateRenderer for BuiltinRenderer {
    #[instrument(skip_all, fields(template = %template))]
    fn render(&self, template: TemplateId, context: &RenderContext) -> ForgeResult<String> {
        let text = self.template(template);
        let unbound = context.unbound(text);
        if !unbound.is_empty() {
            return Err(ApplicationError::RenderingFailed {
                reason: format!("{} uses unbound variables: {}", template, unbound.join(", ")),
            }
            .into());
        }
        Ok(tidy(context.segments(text)))
    }
}

/// Strip trailing whitespace and fold runs of blank lines left by empty
/// bindings.
///
/// Only template text is touched: whitespace and blank lines that belong to
/// a bound value, such as a user-written operation body, are kept as is.
fn tidy<'a>(segments: impl Iterator<Item = Segment<'a>>) -> String {
    let mut out = Tidy::default();
    for segment in segments {
        let from_value = matches!(segment, Segment::Value(_));
        let mut lines = segment.as_str().split('\n');
        if let Some(first) = lines.next() {
            out.push(first, from_value);
        }
        for line in lines {
            out.end_line(from_value);
            out.push(line, from_value);
        }
    }
    out.finish()
}

#[derive(Default)]
struct Tidy {
    out: String,
    line: String,
    /// Length of the current line up to the end of the last value text on it.
    kept: usize,
    blank_run: usize,
}

impl Tidy {
    fn push(&mut self, text: &str, from_value: bool) {
        self.line.push_str(text);
        if from_value && !text.is_empty() {
            self.kept = self.line.len();
        }
    }

    /// `by_value` is set when the newline itself belongs to a value.
    fn end_line(&mut self, by_value: bool) {
        let end = self.kept.max(self.line.trim_end().len());
        let content = &self.line[..end];
        if content.is_empty() {
            self.blank_run += 1;
        } else {
            self.blank_run = 0;
        }
        if by_value || self.blank_run <= 1 {
            self.out.push_str(content);
            self.out.push('\n');
        }
        self.line.clear();
        self.kept = 0;
    }

    fn finish(mut self) -> String {
        if !self.line.is_empty() {
            self.end_line(false);
        }
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskforge_core::error::ForgeError;
    use tempfile::TempDir;

    const BOUND: &[&str] = &[
        "TASK_NAME",
        "TASK_BASENAME",
        "TASK_BASENAME_UPPER",
        "TASK_DOC",
        "SUPERCLASS",
        "SUPERCLASS_INCLUDE",
        "TYPEKIT_INCLUDES",
        "HEADER_CODE_BEFORE",
        "HEADER_CODE_AFTER",
        "IMPLEMENTATION_CODE_BEFORE",
        "IMPLEMENTATION_CODE_AFTER",
        "BASE_MEMBER_DECLARATIONS",
        "INITIALIZER_LIST",
        "CONSTRUCTOR_CODE",
        "DESTRUCTOR_CODE",
        "BASE_METHOD_DECLARATIONS",
        "BASE_METHOD_DEFINITIONS",
        "HOOK_DECLARATIONS",
        "HOOK_DEFINITIONS",
        "USER_MEMBER_DECLARATIONS",
        "USER_METHOD_DECLARATIONS",
        "USER_METHOD_DEFINITIONS",
        "USER_HOOK_DECLARATIONS",
        "USER_HOOK_DEFINITIONS",
        "STATE_DECLARATION_PARAMETER",
        "STATE_DEFINITION_PARAMETER",
        "STATE_FORWARD",
        "STATE_USER_FORWARD",
    ];

    fn context() -> RenderContext {
        let mut ctx = RenderContext::new("demo");
        for key in BOUND {
            ctx.set(*key, "");
        }
        ctx.set("TASK_NAME", "demo::Driver");
        ctx.set("TASK_BASENAME", "Driver");
        ctx.set("TASK_BASENAME_UPPER", "DRIVER");
        ctx.set("SUPERCLASS", "RTT::TaskContext");
        ctx
    }

    #[test]
    fn builtin_templates_only_use_generator_variables() {
        let renderer = BuiltinRenderer::new();
        let ctx = context();
        for id in TemplateId::ALL {
            let text = renderer.render(id, &ctx).unwrap();
            assert!(!text.contains("{{"), "{id} left a placeholder");
        }
    }

    #[test]
    fn base_header_declares_the_base_class() {
        let text = BuiltinRenderer::new()
            .render(TemplateId::TaskBaseHeader, &context())
            .unwrap();
        assert!(text.contains("#ifndef DEMO_DRIVER_TASK_BASE_HPP"));
        assert!(text.contains("class DriverBase : public ::RTT::TaskContext"));
        assert!(!text.contains("\n\n\n"));
    }

    #[test]
    fn overrides_replace_builtin_templates() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Task.hpp"), "// {{TASK_NAME}}\n").unwrap();
        std::fs::write(dir.path().join("README"), "ignored").unwrap();

        let renderer = BuiltinRenderer::with_override_dir(dir.path()).unwrap();
        assert!(renderer.is_overridden(TemplateId::TaskHeader));
        assert!(!renderer.is_overridden(TemplateId::TaskSource));
        assert_eq!(
            renderer.render(TemplateId::TaskHeader, &context()).unwrap(),
            "// demo::Driver\n"
        );
    }

    #[test]
    fn unbound_variables_fail_the_render() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Task.cpp"), "{{TASK_NAME}} {{NOT_BOUND}}").unwrap();
        let renderer = BuiltinRenderer::with_override_dir(dir.path()).unwrap();

        match renderer.render(TemplateId::TaskSource, &context()) {
            Err(ForgeError::Application(ApplicationError::RenderingFailed { reason })) => {
                assert!(reason.contains("NOT_BOUND"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn bound_code_is_emitted_as_written() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Task.cpp"),
            "void {{TASK_BASENAME}}::run()   \n{\n{{BODY}}\n}\n\n\n\n// end\n",
        )
        .unwrap();
        let renderer = BuiltinRenderer::with_override_dir(dir.path()).unwrap();
        let mut ctx = context();
        ctx.set("BODY", "    step();  \n\n\n\n    done();\t");

        assert_eq!(
            renderer.render(TemplateId::TaskSource, &ctx).unwrap(),
            "void Driver::run()\n{\n    step();  \n\n\n\n    done();\t\n}\n\n// end\n"
        );
    }

    #[test]
    fn missing_override_dir_is_reported() {
        assert!(BuiltinRenderer::with_override_dir(Path::new("/definitely/not/here")).is_err());
    }
}
