//! Domain value objects: TypeName, PortDirection, RetentionPolicy, Hook.
//!
//! # Design
//!
//! These are pure value types with equality-by-value and no identity. This
//! file defines the types, their string representations, and their
//! `FromStr` parsers. Behaviour that needs a registry (type legality,
//! numeric checks) lives in `validation.rs` and `entities::types`.

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── TypeName ─────────────────────────────────────────────────────────────────

/// Canonical, slash-separated type name (`/base/Time`, `/std/vector</double>`).
///
/// Two names are equal iff their canonical text matches. C++ style input
/// (`base::Time`, `std::vector<double>`) is normalized on construction, and
/// normalizing an already canonical name is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(String);

impl TypeName {
    /// Normalize a name known to be well formed, such as a literal.
    ///
    /// No check is made; names read from files or the command line go
    /// through [`parse`](Self::parse).
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(normalize(raw.as_ref()))
    }

    /// Normalize `raw`, rejecting a blank name.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let raw = raw.as_ref();
        if raw.trim().is_empty() {
            return Err(DomainError::InvalidName {
                name: raw.to_string(),
                reason: "type names cannot be empty".into(),
            });
        }
        Ok(Self(normalize(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The C++ spelling of this type (`/base/Time` → `base::Time`).
    pub fn cxx_name(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + 8);
        for_each_token(&self.0, |piece| match piece {
            Piece::Token(t) => out.push_str(&t.trim_start_matches('/').replace('/', "::")),
            Piece::Separator(c) => out.push(c),
        });
        out
    }

    /// Last path element (`/base/Time` → `Time`).
    pub fn basename(&self) -> &str {
        let head = self.0.split('<').next().unwrap_or(&self.0);
        head.rsplit('/').next().unwrap_or(head)
    }

    /// Namespace part, with leading and trailing slash (`/base/Time` → `/base/`).
    pub fn namespace(&self) -> &str {
        let head = self.0.split('<').next().unwrap_or(&self.0);
        match head.rfind('/') {
            Some(idx) => &self.0[..=idx],
            None => "/",
        }
    }

    /// True if this names a fixed-size array (`/double[3]`).
    pub fn is_array_syntax(&self) -> bool {
        self.0.ends_with(']')
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TypeName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for TypeName {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

enum Piece<'a> {
    Token(&'a str),
    Separator(char),
}

fn for_each_token<'a>(text: &'a str, mut f: impl FnMut(Piece<'a>)) {
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        if matches!(ch, '<' | '>' | ',') {
            if start < idx {
                f(Piece::Token(&text[start..idx]));
            }
            f(Piece::Separator(ch));
            start = idx + ch.len_utf8();
        }
    }
    if start < text.len() {
        f(Piece::Token(&text[start..]));
    }
}

fn normalize(raw: &str) -> String {
    let replaced = raw.trim().replace("::", "/");
    let mut out = String::with_capacity(replaced.len() + 2);
    for_each_token(&replaced, |piece| match piece {
        Piece::Token(t) => {
            let t = t.trim();
            if t.is_empty() {
                return;
            }
            if !t.starts_with('/') && !t.chars().all(|c| c.is_ascii_digit()) {
                out.push('/');
            }
            out.push_str(t);
        }
        Piece::Separator(c) => out.push(c),
    });
    out
}

// ── PortDirection ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "in",
            Self::Output => "out",
        }
    }

    /// The framework class implementing a port in this direction.
    pub const fn framework_class(&self) -> &'static str {
        match self {
            Self::Input => "RTT::InputPort",
            Self::Output => "RTT::OutputPort",
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── RetentionPolicy ──────────────────────────────────────────────────────────

/// What an output port keeps of the samples written to it.
///
/// There is no "keep both" combination: the framework only supports these
/// three settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep the last written value for late connections.
    Always,
    /// Keep nothing.
    Never,
    /// Keep only the next written value, until it is read.
    #[default]
    OnlyIfUnread,
}

impl RetentionPolicy {
    pub const fn keep_last_written(&self) -> bool {
        matches!(self, Self::Always)
    }

    pub const fn keep_next_written(&self) -> bool {
        matches!(self, Self::OnlyIfUnread)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Never => "never",
            Self::OnlyIfUnread => "only_if_unread",
        }
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetentionPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" | "true" | "last" => Ok(Self::Always),
            "never" | "false" | "none" => Ok(Self::Never),
            "only_if_unread" | "initial" | "next" => Ok(Self::OnlyIfUnread),
            other => Err(DomainError::InvalidName {
                name: other.to_string(),
                reason: "retention must be always, never or only_if_unread".into(),
            }),
        }
    }
}

// ── Hook ─────────────────────────────────────────────────────────────────────

/// Lifecycle hooks of a generated component, in declaration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Hook {
    Configure,
    Start,
    Update,
    Error,
    Exception,
    Fatal,
    Stop,
    Cleanup,
}

impl Hook {
    pub const ALL: [Hook; 8] = [
        Self::Configure,
        Self::Start,
        Self::Update,
        Self::Error,
        Self::Exception,
        Self::Fatal,
        Self::Stop,
        Self::Cleanup,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Start => "start",
            Self::Update => "update",
            Self::Error => "error",
            Self::Exception => "exception",
            Self::Fatal => "fatal",
            Self::Stop => "stop",
            Self::Cleanup => "cleanup",
        }
    }

    /// Name of the C++ method implementing this hook.
    pub fn method_name(&self) -> String {
        format!("{}Hook", self.as_str())
    }

    /// `configure` and `start` may refuse the transition.
    pub const fn returns_bool(&self) -> bool {
        matches!(self, Self::Configure | Self::Start)
    }

    fn expected() -> String {
        Self::ALL
            .iter()
            .map(|h| h.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hook {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| DomainError::UnknownHook {
                name: s.to_string(),
                expected: Self::expected(),
            })
    }
}

// ── ThreadFlag / CodePlacement ───────────────────────────────────────────────

/// Thread in which an operation handler runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ThreadFlag {
    #[default]
    OwnThread,
    ClientThread,
}

impl ThreadFlag {
    pub const fn cxx(&self) -> &'static str {
        match self {
            Self::OwnThread => "RTT::OwnThread",
            Self::ClientThread => "RTT::ClientThread",
        }
    }
}

/// Where a toplevel code snippet goes relative to the class definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CodePlacement {
    #[default]
    BeforeClass,
    AfterClass,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_name_normalizes_cxx_spelling() {
        assert_eq!(TypeName::new("base::Time").as_str(), "/base/Time");
        assert_eq!(
            TypeName::new("std::vector<base::Time>").as_str(),
            "/std/vector</base/Time>"
        );
        assert_eq!(
            TypeName::new("/boost/array</double,8>").as_str(),
            "/boost/array</double,8>"
        );
    }

    #[test]
    fn type_name_normalization_is_idempotent() {
        let once = TypeName::new("std::vector<double>");
        let twice = TypeName::new(once.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn type_name_renders_cxx() {
        assert_eq!(TypeName::new("/base/Time").cxx_name(), "base::Time");
        assert_eq!(
            TypeName::new("/std/vector</double>").cxx_name(),
            "std::vector<double>"
        );
        assert_eq!(TypeName::new("/double[3]").cxx_name(), "double[3]");
    }

    #[test]
    fn type_name_parts() {
        let name = TypeName::new("/base/samples/Frame");
        assert_eq!(name.basename(), "Frame");
        assert_eq!(name.namespace(), "/base/samples/");
        assert_eq!(TypeName::new("/double").namespace(), "/");
    }

    #[test]
    fn type_name_rejects_blank() {
        assert!(TypeName::parse("  ").is_err());
        assert!(matches!(
            TypeName::try_from(""),
            Err(DomainError::InvalidName { .. })
        ));
        assert!("".parse::<TypeName>().is_err());
        assert_eq!(TypeName::new("").as_str(), "");
        assert_eq!("base::Time".parse::<TypeName>().unwrap(), TypeName::new("/base/Time"));
    }

    #[test]
    fn retention_policy_flags() {
        assert!(RetentionPolicy::Always.keep_last_written());
        assert!(!RetentionPolicy::Always.keep_next_written());
        assert!(RetentionPolicy::OnlyIfUnread.keep_next_written());
        assert!(!RetentionPolicy::Never.keep_last_written());
        assert!(!RetentionPolicy::Never.keep_next_written());
        assert_eq!(
            "initial".parse::<RetentionPolicy>().unwrap(),
            RetentionPolicy::OnlyIfUnread
        );
    }

    #[test]
    fn hooks_parse_and_order() {
        assert_eq!("start".parse::<Hook>().unwrap(), Hook::Start);
        assert!("teardown".parse::<Hook>().is_err());
        assert!(Hook::Configure < Hook::Cleanup);
        assert_eq!(Hook::Update.method_name(), "updateHook");
        assert!(Hook::Start.returns_bool());
        assert!(!Hook::Stop.returns_bool());
    }
}
