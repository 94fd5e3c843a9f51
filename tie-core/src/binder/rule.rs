//! Binding rule parser.
//!
//! A declaration attribute holds comma-separated rules of the form
//! `kind: path`. Whitespace around the kind and the colon is tolerated; the
//! path is a single token anchored to the end of the rule.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Regex for a single binding rule.
/// Matches: `text: user.name`
///          `  value :count  `
static RULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^:\s][^:]*?)\s*:\s*(\S+)\s*$").expect("Invalid regex")
});

/// Separator between rules in one declaration.
pub const RULE_SEPARATOR: char = ',';

/// How a path's value is applied to (or read from) an element.
///
/// Any kind string is accepted while parsing; kinds outside the four known
/// ones are kept as [`BindingKind::Other`] and rejected when applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingKind {
    /// Rendered text content.
    Text,
    /// Inner markup, unsanitized.
    Html,
    /// Editable value, written back on change events.
    Value,
    /// Invokes the action stored at the path.
    Click,
    /// Unrecognized kind, kept verbatim.
    Other(String),
}

impl BindingKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "text" => Self::Text,
            "html" => Self::Html,
            "value" => Self::Value,
            "click" => Self::Click,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Html => "html",
            Self::Value => "value",
            Self::Click => "click",
            Self::Other(kind) => kind,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `kind: path` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingRule {
    pub kind: BindingKind,
    pub path: String,
}

impl BindingRule {
    pub fn new(kind: BindingKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

impl fmt::Display for BindingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.path)
    }
}

/// Parser for binding declarations.
pub struct RuleParser;

impl RuleParser {
    /// Parse one rule. Returns `None` when it does not match `kind: path`.
    pub fn parse_rule(rule: &str) -> Option<BindingRule> {
        let caps = RULE_RE.captures(rule)?;
        let kind = caps.get(1)?.as_str();
        let path = caps.get(2)?.as_str();
        Some(BindingRule::new(BindingKind::parse(kind), path))
    }

    /// Split a declaration into its raw rule strings.
    pub fn split_rules(declaration: &str) -> impl Iterator<Item = &str> {
        declaration.split(RULE_SEPARATOR)
    }

    /// Parse every rule of a declaration, returning the first rule that fails.
    pub fn parse_declaration(declaration: &str) -> Result<Vec<BindingRule>, String> {
        Self::split_rules(declaration)
            .map(|rule| Self::parse_rule(rule).ok_or_else(|| rule.to_string()))
            .collect()
    }
}
