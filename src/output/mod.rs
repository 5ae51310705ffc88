//! Output formatters for lint results

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::diagnostic::{Diagnostic, ParseFailure};
use crate::reporter::RunReport;

/// Outcome of linting one input
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Path or display name of the input
    pub input: String,
    pub outcome: Result<RunReport, ParseFailure>,
}

impl FileReport {
    pub fn new(input: impl Into<String>, outcome: Result<RunReport, ParseFailure>) -> Self {
        Self {
            input: input.into(),
            outcome,
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome.as_ref().is_ok_and(RunReport::passed)
    }
}

/// Totals across all linted files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub files: usize,
    pub failed: usize,
    pub exceptions: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl Summary {
    pub fn of(files: &[FileReport]) -> Self {
        let mut summary = Summary {
            files: files.len(),
            ..Default::default()
        };
        for file in files {
            if !file.passed() {
                summary.failed += 1;
            }
            match &file.outcome {
                Ok(report) => {
                    summary.exceptions += report.exceptions.len();
                    summary.errors += report.errors.len();
                    summary.warnings += report.warnings.len();
                }
                Err(_) => summary.errors += 1,
            }
        }
        summary
    }
}

/// Output formatter trait
pub trait OutputFormatter: Send + Sync {
    /// Format the results of a whole invocation
    fn format(&self, files: &[FileReport]) -> String;

    /// Format a single diagnostic
    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String;
}
