//! Core linter engine

use crate::config::RulesConfig;
use crate::diagnostic::{Issue, ParseFailure};
use crate::document::Document;
use crate::executor;
use crate::registry::RuleRegistry;
use crate::reporter::{ReportListener, Reporter, RunReport};
use crate::rule::RuleContext;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Input names longer than this are shortened in parse failure messages
const MAX_DISPLAY_NAME: usize = 27;

/// The main linter engine.
///
/// Holds a rule configuration and the registry used to resolve rule names.
/// Every run is independent: rule instances, reporters and the parsed
/// document are created fresh per call.
pub struct Linter {
    rules: RulesConfig,
    registry: RuleRegistry,
    listeners: Vec<Arc<dyn ReportListener>>,
}

impl Linter {
    /// Create a linter for a rule configuration, using the built-in rules
    pub fn new(rules: RulesConfig) -> Self {
        Self {
            rules,
            registry: RuleRegistry::builtin(),
            listeners: Vec::new(),
        }
    }

    /// Resolve rule names through `registry` instead of the built-in one
    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Attach a listener to the reporter of every rule instance
    pub fn subscribe(mut self, listener: Arc<dyn ReportListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Lint `input` and return everything the rules reported.
    ///
    /// `input` is either the path of a file or the document text itself.
    /// Fails only when the text is not a well-formed document.
    pub async fn run(&self, input: &str) -> Result<RunReport, ParseFailure> {
        let (text, filepath) = resolve_input(input);
        log::debug!("Linting {}", display_name(input));

        let document = Document::parse(&text).map(Arc::new).map_err(|e| {
            let input = display_name(input);
            ParseFailure {
                message: format!("Error in {}: SVG parsing error: {}", input, e),
                input,
            }
        })?;
        let context = RuleContext { filepath };

        let mut runnable = Vec::new();
        for instance in self.rules.instances() {
            match self.registry.resolve(&instance.name, &instance.options) {
                Ok(rule) => runnable.push((instance.name, rule)),
                Err(e) => log::warn!("{}. It will be ignored", e),
            }
        }
        log::debug!("Running {} rule instance(s)", runnable.len());

        let runs = runnable.iter().map(|(name, rule)| {
            let reporter = Reporter::new(name);
            for listener in &self.listeners {
                reporter.subscribe(Arc::clone(listener));
            }
            executor::execute(rule.as_ref(), reporter, &document, &context)
        });

        let mut report = RunReport::default();
        for instance_report in join_all(runs).await {
            report.merge(instance_report);
        }

        log::debug!(
            "Finished with {} exception(s), {} error(s), {} warning(s)",
            report.exceptions.len(),
            report.errors.len(),
            report.warnings.len()
        );
        Ok(report)
    }

    /// Lint `input` and reduce the outcome to a verdict.
    ///
    /// On failure the issues are the rule exceptions followed by the error
    /// diagnostics, or the single parse failure.
    pub async fn lint(&self, input: &str) -> Result<(), Vec<Issue>> {
        match self.run(input).await {
            Ok(report) => verdict(report),
            Err(failure) => Err(vec![Issue::Parse(failure)]),
        }
    }

    /// Like [`Linter::lint`], also handing the outcome to `callback` once
    pub async fn lint_with<F>(&self, input: &str, callback: F) -> Result<(), Vec<Issue>>
    where
        F: FnOnce(&Result<(), Vec<Issue>>),
    {
        let outcome = self.lint(input).await;
        callback(&outcome);
        outcome
    }
}

/// Pass when nothing failed, else the exceptions followed by the errors
pub fn verdict(report: RunReport) -> Result<(), Vec<Issue>> {
    if report.passed() {
        return Ok(());
    }
    let issues = report
        .exceptions
        .into_iter()
        .map(Issue::Exception)
        .chain(report.errors.into_iter().map(Issue::Error))
        .collect();
    Err(issues)
}

/// Read `input` as a file when it looks like a path to a readable file,
/// otherwise use it as the document text
fn resolve_input(input: &str) -> (String, Option<PathBuf>) {
    if !looks_like_path(input) {
        return (input.to_string(), None);
    }
    let path = Path::new(input);
    match std::fs::read_to_string(path) {
        Ok(text) => (text, Some(path.to_path_buf())),
        Err(e) => {
            log::trace!("Treating input as text, not a readable file: {}", e);
            (input.to_string(), None)
        }
    }
}

fn looks_like_path(input: &str) -> bool {
    !input.is_empty() && !input.contains('<') && !input.contains('\n')
}

/// Shorten long inputs to `first 13 chars...last 14 chars`
pub fn display_name(input: &str) -> String {
    let count = input.chars().count();
    if count <= MAX_DISPLAY_NAME {
        return input.to_string();
    }
    let head: String = input.chars().take(13).collect();
    let tail: String = input.chars().skip(count - 14).collect();
    format!("{}...{}", head, tail)
}
