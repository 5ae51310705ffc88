//! Diagnostic types for linting results

use crate::document::NodeRef;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, never affects the verdict
    Log,
    /// Potential issue, never affects the verdict
    Warning,
    /// Failing check
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Log => write!(f, "log"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A console-style message: one or more values printed separated by spaces.
///
/// Strings print verbatim, every other value prints as compact JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    parts: Vec<Value>,
}

impl Message {
    pub fn new(parts: Vec<Value>) -> Self {
        Self { parts }
    }

    /// The values as given by the rule
    pub fn parts(&self) -> &[Value] {
        &self.parts
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match part {
                Value::String(s) => f.write_str(s)?,
                other => write!(f, "{}", other)?,
            }
        }
        Ok(())
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Self::new(vec![Value::String(s.to_string())])
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Self::new(vec![Value::String(s)])
    }
}

impl From<Value> for Message {
    fn from(value: Value) -> Self {
        Self::new(vec![value])
    }
}

impl From<Vec<Value>> for Message {
    fn from(parts: Vec<Value>) -> Self {
        Self::new(parts)
    }
}

impl<const N: usize> From<[Value; N]> for Message {
    fn from(parts: [Value; N]) -> Self {
        Self::new(parts.into())
    }
}

/// A single reported item, attributable to one rule instance
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Name of the rule that reported this
    pub rule: String,
    /// Severity level
    pub severity: Severity,
    /// Message as given by the rule
    pub raw: Message,
    /// Human-readable message, prefixed with `"<rule>: "`
    pub message: String,
    /// Related node, if any
    pub node: Option<NodeRef>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(rule: &str, severity: Severity, raw: Message, node: Option<NodeRef>) -> Self {
        let message = format!("{}: {}", rule, raw);
        Self {
            rule: rule.to_string(),
            severity,
            raw,
            message,
            node,
        }
    }

    /// 1-based line and column of the related node
    pub fn location(&self) -> Option<(usize, usize)> {
        self.node.as_ref().map(|n| n.node().location())
    }

    /// Source excerpt around the related node: the line it starts on and a
    /// caret under its first character
    pub fn trace(&self) -> Option<String> {
        let node_ref = self.node.as_ref()?;
        let node = node_ref.node();
        let (line, column) = node.location();
        let source = node.source_line()?;
        Some(format!(
            "{:>4} | {}\n     | {}^",
            line,
            source,
            " ".repeat(column.saturating_sub(1))
        ))
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A rule that failed instead of completing its check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleException {
    /// Name of the rule that failed
    pub rule: String,
    /// Error text, prefixed with `"<rule>: "`
    pub message: String,
}

impl RuleException {
    pub fn new(rule: &str, error: &str) -> Self {
        Self {
            rule: rule.to_string(),
            message: format!("{}: {}", rule, error),
        }
    }
}

impl fmt::Display for RuleException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// The input could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// Display name of the input (possibly truncated)
    pub input: String,
    /// `"Error in <input>: SVG parsing error: <reason>"`
    pub message: String,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// One entry of a failed run
#[derive(Debug, Clone)]
pub enum Issue {
    /// The input could not be parsed; always the only issue of its run
    Parse(ParseFailure),
    /// A rule failed while running
    Exception(RuleException),
    /// A rule reported an error
    Error(Diagnostic),
}

impl Issue {
    pub fn message(&self) -> &str {
        match self {
            Issue::Parse(p) => &p.message,
            Issue::Exception(e) => &e.message,
            Issue::Error(d) => &d.message,
        }
    }

    /// Rule the issue is attributed to, `None` for parse failures
    pub fn rule(&self) -> Option<&str> {
        match self {
            Issue::Parse(_) => None,
            Issue::Exception(e) => Some(&e.rule),
            Issue::Error(d) => Some(&d.rule),
        }
    }

    pub fn is_exception(&self) -> bool {
        matches!(self, Issue::Exception(_))
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Log);
    }

    #[test]
    fn test_message_console_style() {
        let message = Message::from(vec![json!("Expected"), json!(3), json!("elements, got"), json!([1, 2])]);
        assert_eq!(message.to_string(), "Expected 3 elements, got [1,2]");
        assert_eq!(message.parts().len(), 4);
        assert_eq!(Message::from("plain").to_string(), "plain");
    }

    #[test]
    fn test_diagnostic_prefix() {
        let diag = Diagnostic::new("elm", Severity::Error, "Element disallowed".into(), None);
        assert_eq!(diag.message, "elm: Element disallowed");
        assert!(diag.is_error());
        assert!(diag.location().is_none());
        assert!(diag.trace().is_none());
    }

    #[test]
    fn test_diagnostic_trace() {
        let doc = Arc::new(Document::parse("<svg>\n  <g/>\n</svg>").unwrap());
        let g = doc.elements().find(|n| n.name() == "g").unwrap().id();
        let diag = Diagnostic::new(
            "elm",
            Severity::Warning,
            "Found".into(),
            Some(doc.node_ref(g)),
        );
        assert_eq!(diag.location(), Some((2, 3)));
        assert_eq!(diag.trace().unwrap(), "   2 |   <g/>\n     |   ^");
    }

    #[test]
    fn test_diagnostic_trace_non_ascii() {
        let doc = Arc::new(Document::parse("<svg>\n  <text>é</text><g/>\n</svg>").unwrap());
        let g = doc.elements().find(|n| n.name() == "g").unwrap().id();
        let diag = Diagnostic::new("elm", Severity::Error, "Found".into(), Some(doc.node_ref(g)));
        assert_eq!(diag.location(), Some((2, 17)));
        assert_eq!(
            diag.trace().unwrap(),
            format!("   2 |   <text>é</text><g/>\n     | {}^", " ".repeat(16))
        );
    }

    #[test]
    fn test_issue_accessors() {
        let issue = Issue::Exception(RuleException::new("custom", "Foo"));
        assert_eq!(issue.message(), "custom: Foo");
        assert_eq!(issue.rule(), Some("custom"));
        assert!(issue.is_exception());
    }
}
