//! Template identifiers and the variable bindings they are rendered with.
//!
//! ```text
//! TemplateId ──► TemplateRenderer (port) ──► text
//!                      ▲
//! RenderContext ───────┘   {{TASK_BASENAME}} -> "Driver"
//! ```
//!
//! The generator pre-renders every list (member declarations, hook bodies,
//! method definitions) into plain strings, so templates only need flat
//! `{{VARIABLE}}` substitution.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::domain::error::DomainError;

/// The four templates making up a generated task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateId {
    TaskBaseHeader,
    TaskBaseSource,
    TaskHeader,
    TaskSource,
}

impl TemplateId {
    pub const ALL: [TemplateId; 4] = [
        Self::TaskBaseHeader,
        Self::TaskBaseSource,
        Self::TaskHeader,
        Self::TaskSource,
    ];

    /// File name of the template, also used for override lookup.
    pub const fn file_name(&self) -> &'static str {
        match self {
            Self::TaskBaseHeader => "TaskBase.hpp",
            Self::TaskBaseSource => "TaskBase.cpp",
            Self::TaskHeader => "Task.hpp",
            Self::TaskSource => "Task.cpp",
        }
    }

    /// Base templates are regenerated on every run.
    pub const fn is_base(&self) -> bool {
        matches!(self, Self::TaskBaseHeader | Self::TaskBaseSource)
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

impl FromStr for TemplateId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.file_name() == s)
            .ok_or_else(|| DomainError::InvalidName {
                name: s.to_string(),
                reason: "not a task template name".into(),
            })
    }
}

/// Part of a rendered template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal template text, unbound placeholders included.
    Text(&'a str),
    /// The value bound to a placeholder.
    Value(&'a str),
}

impl<'a> Segment<'a> {
    pub fn as_str(&self) -> &'a str {
        match *self {
            Self::Text(text) | Self::Value(text) => text,
        }
    }
}

/// Variable bindings for one render.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    variables: BTreeMap<String, String>,
}

impl RenderContext {
    /// Starts with `PROJECT_NAME` and `PROJECT_NAME_UPPER`.
    pub fn new(project_name: impl Into<String>) -> Self {
        let name = project_name.into();
        Self::default()
            .with_variable("PROJECT_NAME_UPPER", to_upper_snake_case(&name))
            .with_variable("PROJECT_NAME", name)
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Substitute every bound `{{VARIABLE}}` in one pass. Unbound
    /// placeholders and substituted text are left untouched.
    pub fn render(&self, template: &str) -> String {
        self.segments(template).map(|segment| segment.as_str()).collect()
    }

    /// `template` split into its literal text and the bound values that
    /// replace its placeholders, in order.
    pub fn segments<'s>(&'s self, template: &'s str) -> impl Iterator<Item = Segment<'s>> {
        let mut pieces = Vec::new();
        let mut copied = 0;
        for (range, key) in placeholders(template) {
            if let Some(value) = self.get(key) {
                pieces.push(Segment::Text(&template[copied..range.start]));
                pieces.push(Segment::Value(value));
                copied = range.end;
            }
        }
        pieces.push(Segment::Text(&template[copied..]));
        pieces.into_iter().filter(|piece| !piece.as_str().is_empty())
    }

    /// Placeholders of `template` that have no binding.
    pub fn unbound<'t>(&self, template: &'t str) -> Vec<&'t str> {
        placeholders(template)
            .filter(|(_, key)| !self.variables.contains_key(*key))
            .map(|(_, key)| key)
            .collect()
    }
}

/// `{{KEY}}` occurrences with their byte range. Keys are upper-case
/// identifiers, so `{{ other }}` is plain text.
fn placeholders(template: &str) -> impl Iterator<Item = (Range<usize>, &str)> {
    let mut offset = 0;
    std::iter::from_fn(move || {
        loop {
            let start = offset + template[offset..].find("{{")?;
            let key_start = start + 2;
            let key_len = template[key_start..].find("}}")?;
            let key = &template[key_start..key_start + key_len];
            let end = key_start + key_len + 2;
            let is_key = !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
            if is_key {
                offset = end;
                return Some((start..end, key));
            }
            offset = key_start;
        }
    })
}

/// `laserDriver`, `LaserDriver` or `demo::Laser` to `LASER_DRIVER`,
/// `LASER_DRIVER`, `DEMO_LASER`. Acronyms stay together: `HTTPServer` gives
/// `HTTP_SERVER`.
pub fn to_upper_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();
        let word_start = c.is_uppercase()
            && prev.is_some_and(|p| {
                p.is_lowercase()
                    || p.is_ascii_digit()
                    || (p.is_uppercase() && next.is_some_and(char::is_lowercase))
            });
        if word_start && !out.ends_with('_') {
            out.push('_');
        }
        out.extend(c.to_uppercase());
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}
