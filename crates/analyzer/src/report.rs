//! Diagnostics collected while analyzing a single file.

use std::fmt;

use serde::Serialize;

use crate::ast::{Node, SourceLocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{text}")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

/// Accumulates diagnostics for one file. Every analysis appends into the
/// same report; the runner drains it sorted by source position.
#[derive(Debug, Default)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, node: &Node, message: impl Into<String>) {
        self.push(Severity::Error, node.location, message.into());
    }

    pub fn warning(&mut self, node: &Node, message: impl Into<String>) {
        self.push(Severity::Warning, node.location, message.into());
    }

    pub fn info(&mut self, node: &Node, message: impl Into<String>) {
        self.push(Severity::Info, node.location, message.into());
    }

    pub fn error_at(&mut self, location: SourceLocation, message: impl Into<String>) {
        self.push(Severity::Error, location, message.into());
    }

    pub fn warning_at(&mut self, location: SourceLocation, message: impl Into<String>) {
        self.push(Severity::Warning, location, message.into());
    }

    fn push(&mut self, severity: Severity, location: SourceLocation, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            message,
            line: location.line,
            column: location.column,
        });
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Consumes the report, returning diagnostics in source order.
    pub fn into_diagnostics(mut self) -> Vec<Diagnostic> {
        self.diagnostics
            .sort_by_key(|diagnostic| (diagnostic.line, diagnostic.column));
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_drain_in_source_order() {
        let mut report = Report::new();
        report.error_at(SourceLocation { line: 9, column: 2 }, "late");
        report.warning_at(SourceLocation { line: 1, column: 4 }, "early");
        report.error_at(SourceLocation { line: 9, column: 0 }, "same line, left");

        let messages: Vec<_> = report
            .into_diagnostics()
            .into_iter()
            .map(|diagnostic| diagnostic.message)
            .collect();
        assert_eq!(messages, vec!["early", "same line, left", "late"]);
    }

    #[test]
    fn error_presence_is_tracked() {
        let mut report = Report::new();
        report.warning_at(SourceLocation { line: 1, column: 0 }, "only a warning");
        assert!(!report.has_errors());

        report.error_at(SourceLocation { line: 2, column: 0 }, "now an error");
        assert!(report.has_errors());
    }

    #[test]
    fn diagnostics_serialize_with_lowercase_severities() {
        let diagnostic = Diagnostic {
            severity: Severity::Warning,
            message: "unused local variable x".to_owned(),
            line: 3,
            column: 2,
        };

        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["line"], 3);
    }
}
