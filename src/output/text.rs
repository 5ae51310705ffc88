//! Human-readable text output formatter

use super::{FileReport, OutputFormatter, Summary};
use crate::diagnostic::{Diagnostic, RuleException, Severity};
use colored::*;

/// Text formatter with optional color support
pub struct TextFormatter {
    /// Enable colored output
    pub colored: bool,

    /// Show the source excerpt of diagnostics tied to a node
    pub show_source: bool,

    /// Show log messages
    pub show_logs: bool,

    /// Show statistics
    pub show_stats: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            colored: true,
            show_source: true,
            show_logs: false,
            show_stats: true,
        }
    }
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    /// Include log messages
    pub fn with_logs(mut self) -> Self {
        self.show_logs = true;
        self
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.colored {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn severity_str(&self, severity: Severity) -> String {
        let s = severity.to_string();
        match severity {
            Severity::Error => self.paint(&s, |s| s.red().bold()),
            Severity::Warning => self.paint(&s, |s| s.yellow().bold()),
            Severity::Log => self.paint(&s, |s| s.blue()),
        }
    }

    fn format_exception(&self, exception: &RuleException) -> String {
        format!(
            "  {}[{}]: {}\n",
            self.paint("exception", |s| s.magenta().bold()),
            self.paint(&exception.rule, |s| s.cyan()),
            exception.message
        )
    }

    fn format_file(&self, file: &FileReport, output: &mut String) {
        let verdict = if file.passed() {
            self.paint("pass", |s| s.green())
        } else {
            self.paint("fail", |s| s.red())
        };
        output.push_str(&format!(
            "{} {}\n",
            self.paint(&file.input, |s| s.underline()),
            verdict
        ));

        let report = match &file.outcome {
            Ok(report) => report,
            Err(failure) => {
                output.push_str(&format!(
                    "  {}: {}\n",
                    self.severity_str(Severity::Error),
                    failure.message
                ));
                return;
            }
        };

        for exception in &report.exceptions {
            output.push_str(&self.format_exception(exception));
        }
        for diag in report.errors.iter().chain(&report.warnings) {
            output.push_str(&self.format_diagnostic(diag));
        }
        if self.show_logs {
            for diag in &report.logs {
                output.push_str(&self.format_diagnostic(diag));
            }
        }
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, files: &[FileReport]) -> String {
        let mut output = String::new();

        for file in files {
            self.format_file(file, &mut output);
        }

        if self.show_stats {
            let summary = Summary::of(files);
            output.push_str(&format!("\n{} processed", plural(summary.files, "file")));

            let mut counts = Vec::new();
            if summary.exceptions > 0 {
                counts.push(self.paint(&plural(summary.exceptions, "exception"), |s| s.magenta()));
            }
            if summary.errors > 0 {
                counts.push(self.paint(&plural(summary.errors, "error"), |s| s.red()));
            }
            if summary.warnings > 0 {
                counts.push(self.paint(&plural(summary.warnings, "warning"), |s| s.yellow()));
            }
            if !counts.is_empty() {
                output.push_str(&format!(": {}", counts.join(", ")));
            }
            output.push('\n');
        }

        output
    }

    fn format_diagnostic(&self, diag: &Diagnostic) -> String {
        let mut output = String::new();

        let location = diag
            .location()
            .map(|(line, column)| format!("{}:{}: ", line, column))
            .unwrap_or_default();
        output.push_str(&format!(
            "  {}{}[{}]: {}\n",
            location,
            self.severity_str(diag.severity),
            self.paint(&diag.rule, |s| s.cyan()),
            diag.message
        ));

        if self.show_source {
            if let Some(trace) = diag.trace() {
                for line in trace.lines() {
                    output.push_str(&format!("  {}\n", self.paint(line, |s| s.dimmed())));
                }
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::ParseFailure;
    use crate::document::Document;
    use crate::reporter::{Reporter, RunReport};
    use std::sync::Arc;

    #[test]
    fn test_format_diagnostic() {
        let formatter = TextFormatter::new().without_color();
        let doc = Arc::new(Document::parse("<svg>\n  <g/>\n</svg>").unwrap());
        let g = doc.elements().find(|n| n.name() == "g").unwrap().id();
        let reporter = Reporter::new("elm");
        reporter.error_at("Element disallowed", doc.node_ref(g));

        let report = reporter.take_report();
        let output = formatter.format_diagnostic(&report.errors[0]);
        assert!(output.contains("2:3: error[elm]: elm: Element disallowed"));
        assert!(output.contains("   2 |   <g/>"));
        assert!(output.contains("|   ^"));
    }

    #[test]
    fn test_format_files() {
        let formatter = TextFormatter::new().without_color();
        let reporter = Reporter::new("custom");
        reporter.exception("Foo");
        reporter.warn("careful");
        reporter.log("hidden");

        let files = vec![
            FileReport::new("ok.svg", Ok(RunReport::default())),
            FileReport::new("bad.svg", Ok(reporter.take_report())),
            FileReport::new(
                "broken.svg",
                Err(ParseFailure {
                    input: "broken.svg".into(),
                    message: "Error in broken.svg: SVG parsing error: x".into(),
                }),
            ),
        ];

        let output = formatter.format(&files);
        assert!(output.contains("ok.svg pass"));
        assert!(output.contains("bad.svg fail"));
        assert!(output.contains("exception[custom]: custom: Foo"));
        assert!(output.contains("warning[custom]: custom: careful"));
        assert!(!output.contains("hidden"));
        assert!(output.contains("Error in broken.svg: SVG parsing error: x"));
        assert!(output.contains("3 files processed: 1 exception, 1 error, 1 warning"));
    }

    #[test]
    fn test_logs_shown_on_request() {
        let formatter = TextFormatter::new().without_color().with_logs();
        let reporter = Reporter::new("custom");
        reporter.log("shown");
        let output = formatter.format(&[FileReport::new("a.svg", Ok(reporter.take_report()))]);
        assert!(output.contains("log[custom]: custom: shown"));
        assert!(output.contains("1 file processed\n"));
    }
}
