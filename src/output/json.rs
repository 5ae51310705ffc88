//! JSON output formatter

use super::{FileReport, OutputFormatter, Summary};
use crate::diagnostic::{Diagnostic, Severity};
use serde::Serialize;
use serde_json::Value;

/// JSON formatter for machine-readable output
#[derive(Default)]
pub struct JsonFormatter {
    /// Pretty print with indentation
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        if self.pretty {
            serde_json::to_string_pretty(value).unwrap_or_default()
        } else {
            serde_json::to_string(value).unwrap_or_default()
        }
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    files: Vec<JsonFile<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    file: &'a str,
    passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_error: Option<&'a str>,
    exceptions: Vec<JsonException<'a>>,
    diagnostics: Vec<JsonDiagnostic<'a>>,
}

#[derive(Serialize)]
struct JsonException<'a> {
    rule: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    rule: &'a str,
    severity: Severity,
    message: &'a str,
    parts: &'a [Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_line: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonSummary {
    files_processed: usize,
    files_failed: usize,
    exception_count: usize,
    error_count: usize,
    warning_count: usize,
}

impl<'a> JsonDiagnostic<'a> {
    fn new(diag: &'a Diagnostic) -> Self {
        let location = diag.location();
        Self {
            rule: &diag.rule,
            severity: diag.severity,
            message: &diag.message,
            parts: diag.raw.parts(),
            line: location.map(|(line, _)| line),
            column: location.map(|(_, column)| column),
            source_line: diag.node.as_ref().and_then(|n| n.node().source_line()),
        }
    }
}

impl<'a> JsonFile<'a> {
    fn new(file: &'a FileReport) -> Self {
        let mut json = JsonFile {
            file: &file.input,
            passed: file.passed(),
            parse_error: None,
            exceptions: Vec::new(),
            diagnostics: Vec::new(),
        };
        match &file.outcome {
            Ok(report) => {
                json.exceptions = report
                    .exceptions
                    .iter()
                    .map(|e| JsonException {
                        rule: &e.rule,
                        message: &e.message,
                    })
                    .collect();
                json.diagnostics = report
                    .errors
                    .iter()
                    .chain(&report.warnings)
                    .chain(&report.logs)
                    .map(JsonDiagnostic::new)
                    .collect();
            }
            Err(failure) => json.parse_error = Some(&failure.message),
        }
        json
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, files: &[FileReport]) -> String {
        let summary = Summary::of(files);
        let output = JsonOutput {
            files: files.iter().map(JsonFile::new).collect(),
            summary: JsonSummary {
                files_processed: summary.files,
                files_failed: summary.failed,
                exception_count: summary.exceptions,
                error_count: summary.errors,
                warning_count: summary.warnings,
            },
        };
        self.render(&output)
    }

    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        self.render(&JsonDiagnostic::new(diagnostic))
    }
}
