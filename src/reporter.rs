//! Per-rule collector of exceptions, errors, warnings and logs

use crate::diagnostic::{Diagnostic, Message, RuleException, Severity};
use crate::document::NodeRef;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Something a rule reported, as seen by live listeners
#[derive(Debug, Clone, Copy)]
pub enum ReportEvent<'a> {
    Exception(&'a RuleException),
    Error(&'a Diagnostic),
    Warning(&'a Diagnostic),
    Log(&'a Diagnostic),
}

/// Observer notified of every item a reporter records, as it is recorded.
///
/// Used by progress displays; the collected [`RunReport`] does not depend on
/// listeners.
pub trait ReportListener: Send + Sync {
    fn on_event(&self, rule: &str, event: &ReportEvent<'_>);
}

impl<F> ReportListener for F
where
    F: Fn(&str, &ReportEvent<'_>) + Send + Sync,
{
    fn on_event(&self, rule: &str, event: &ReportEvent<'_>) {
        self(rule, event)
    }
}

/// Everything reported during one run, or by one rule instance
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub exceptions: Vec<RuleException>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub logs: Vec<Diagnostic>,
}

impl RunReport {
    /// A run passes when no rule failed and no rule reported an error
    pub fn passed(&self) -> bool {
        self.exceptions.is_empty() && self.errors.is_empty()
    }

    /// Append another report, keeping each sequence in order
    pub fn merge(&mut self, other: RunReport) {
        self.exceptions.extend(other.exceptions);
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.logs.extend(other.logs);
    }

    /// Total number of recorded items
    pub fn len(&self) -> usize {
        self.exceptions.len() + self.errors.len() + self.warnings.len() + self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
struct ReporterState {
    report: RunReport,
    listeners: Vec<Arc<dyn ReportListener>>,
}

/// Handle rules use to report findings.
///
/// Each rule instance gets its own reporter. The handle is cheap to clone so
/// deferred rule work can keep reporting after the rule returns.
#[derive(Clone)]
pub struct Reporter {
    name: Arc<str>,
    state: Arc<Mutex<ReporterState>>,
}

impl Reporter {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            state: Arc::new(Mutex::new(ReporterState::default())),
        }
    }

    /// Name of the rule this reporter belongs to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a live listener
    pub fn subscribe(&self, listener: Arc<dyn ReportListener>) {
        self.state().listeners.push(listener);
    }

    /// Record that the rule failed unexpectedly.
    ///
    /// This does not stop other rules, but it fails the run since the rule's
    /// result cannot be trusted.
    pub fn exception(&self, error: impl fmt::Display) {
        let exception = RuleException::new(&self.name, &error.to_string());
        log::debug!(target: "svglint::rule", "[{}] Exception reported: {}", self.name, error);
        self.notify(&ReportEvent::Exception(&exception));
        self.state().report.exceptions.push(exception);
    }

    /// Record a failing check
    pub fn error(&self, message: impl Into<Message>) {
        self.record(Severity::Error, message.into(), None);
    }

    /// Record a failing check related to a node
    pub fn error_at(&self, message: impl Into<Message>, node: NodeRef) {
        self.record(Severity::Error, message.into(), Some(node));
    }

    /// Record a warning
    pub fn warn(&self, message: impl Into<Message>) {
        self.record(Severity::Warning, message.into(), None);
    }

    /// Record a warning related to a node
    pub fn warn_at(&self, message: impl Into<Message>, node: NodeRef) {
        self.record(Severity::Warning, message.into(), Some(node));
    }

    /// Record an informational message
    pub fn log(&self, message: impl Into<Message>) {
        self.record(Severity::Log, message.into(), None);
    }

    /// Record an informational message related to a node
    pub fn log_at(&self, message: impl Into<Message>, node: NodeRef) {
        self.record(Severity::Log, message.into(), Some(node));
    }

    /// Record a diagnostic of the given severity
    pub fn record(&self, severity: Severity, message: Message, node: Option<NodeRef>) {
        log::debug!(target: "svglint::rule", "[{}] {} reported: {}", self.name, severity, message);
        let diagnostic = Diagnostic::new(&self.name, severity, message, node);

        let event = match severity {
            Severity::Error => ReportEvent::Error(&diagnostic),
            Severity::Warning => ReportEvent::Warning(&diagnostic),
            Severity::Log => ReportEvent::Log(&diagnostic),
        };
        self.notify(&event);

        let mut state = self.state();
        match severity {
            Severity::Error => state.report.errors.push(diagnostic),
            Severity::Warning => state.report.warnings.push(diagnostic),
            Severity::Log => state.report.logs.push(diagnostic),
        }
    }

    /// Snapshot of everything recorded so far
    pub fn report(&self) -> RunReport {
        self.state().report.clone()
    }

    /// Take everything recorded, leaving the reporter empty
    pub fn take_report(&self) -> RunReport {
        std::mem::take(&mut self.state().report)
    }

    fn notify(&self, event: &ReportEvent<'_>) {
        // Listeners run outside the lock so they may inspect the reporter.
        let listeners = self.state().listeners.clone();
        for listener in listeners {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                listener.on_event(&self.name, event);
            }));
            if let Err(payload) = outcome {
                log::warn!(
                    "[{}] Listener panicked: {}",
                    self.name,
                    crate::executor::panic_message(payload.as_ref())
                );
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, ReporterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_records_in_order() {
        let reporter = Reporter::new("attr");
        reporter.error("first");
        reporter.warn("careful");
        reporter.error(vec![json!("second"), json!(2)]);
        reporter.log("fyi");

        let report = reporter.report();
        let errors: Vec<_> = report.errors.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(errors, vec!["attr: first", "attr: second 2"]);
        assert_eq!(report.warnings[0].message, "attr: careful");
        assert_eq!(report.logs[0].severity, Severity::Log);
        assert!(!report.passed());
    }

    #[test]
    fn test_warnings_and_logs_pass() {
        let reporter = Reporter::new("elm");
        reporter.warn("w");
        reporter.log("l");
        assert!(reporter.report().passed());
    }

    #[test]
    fn test_exception_fails() {
        let reporter = Reporter::new("custom");
        reporter.exception("Foo");
        let report = reporter.take_report();
        assert_eq!(report.exceptions[0].message, "custom: Foo");
        assert!(!report.passed());
        assert!(reporter.report().is_empty());
    }

    #[test]
    fn test_node_reference_kept() {
        let doc = Arc::new(Document::parse("<svg><g/></svg>").unwrap());
        let g = doc.elements().find(|n| n.name() == "g").unwrap().id();
        let reporter = Reporter::new("elm");
        reporter.error_at("Element disallowed", doc.node_ref(g));

        let report = reporter.report();
        let node = report.errors[0].node.as_ref().unwrap();
        assert_eq!(node.node().name(), "g");
    }

    #[test]
    fn test_listeners_notified() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let reporter = Reporter::new("elm");
        reporter.subscribe(Arc::new(move |rule: &str, event: &ReportEvent<'_>| {
            assert_eq!(rule, "elm");
            if matches!(event, ReportEvent::Error(_) | ReportEvent::Exception(_)) {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        }));

        reporter.error("e");
        reporter.warn("w");
        reporter.exception("x");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_recording() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let reporter = Reporter::new("custom");
        reporter.subscribe(Arc::new(|_: &str, event: &ReportEvent<'_>| {
            if matches!(event, ReportEvent::Exception(_)) {
                panic!("listener exploded");
            }
        }));
        reporter.subscribe(Arc::new(move |_: &str, _: &ReportEvent<'_>| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        reporter.exception("boom");
        reporter.error("e");

        let report = reporter.report();
        assert_eq!(report.exceptions[0].message, "custom: boom");
        assert_eq!(report.errors[0].message, "custom: e");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_merge_keeps_order() {
        let a = Reporter::new("a");
        a.error("1");
        let b = Reporter::new("b");
        b.error("2");

        let mut report = RunReport::default();
        report.merge(a.take_report());
        report.merge(b.take_report());
        let messages: Vec<_> = report.errors.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["a: 1", "b: 2"]);
        assert_eq!(report.len(), 2);
    }
}
