//! Runs one rule instance and isolates its failures

use crate::diagnostic::Severity;
use crate::document::Document;
use crate::reporter::{Reporter, RunReport};
use crate::rule::{Completion, Rule, RuleContext};
use futures::FutureExt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Run `rule` against `document` and collect what it reported.
///
/// Deferred completions are awaited. An error returned by the rule, an error
/// from its deferred work, or a panic in either is recorded as an exception
/// on `reporter` and never escapes. Findings the rule returns directly are
/// recorded as errors, the same as reported ones.
pub async fn execute(
    rule: &dyn Rule,
    reporter: Reporter,
    document: &Arc<Document>,
    context: &RuleContext,
) -> RunReport {
    let started =
        panic::catch_unwind(AssertUnwindSafe(|| rule.check(&reporter, document, context)));

    let outcome = match started {
        Ok(Ok(Completion::Immediate(findings))) => Ok(findings),
        Ok(Ok(Completion::Deferred(pending))) => {
            log::trace!("[{}] waiting for deferred completion", reporter.name());
            match AssertUnwindSafe(pending).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(anyhow::anyhow!(panic_message(payload.as_ref()))),
            }
        }
        Ok(Err(error)) => Err(error),
        Err(payload) => Err(anyhow::anyhow!(panic_message(payload.as_ref()))),
    };

    match outcome {
        Ok(findings) => {
            for finding in findings {
                reporter.record(Severity::Error, finding.message, finding.node);
            }
        }
        Err(error) => reporter.exception(format!("{:#}", error)),
    }

    reporter.take_report()
}

/// Text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "rule panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Finding, Findings};
    use std::time::Duration;

    fn document() -> Arc<Document> {
        Arc::new(Document::parse("<svg><g/></svg>").unwrap())
    }

    async fn run<R: Rule>(rule: R) -> RunReport {
        execute(&rule, Reporter::new("custom"), &document(), &RuleContext::default()).await
    }

    #[tokio::test]
    async fn test_immediate_success() {
        let report = run(|_: &Reporter, _: &Arc<Document>, _: &RuleContext| -> anyhow::Result<Completion> {
            Ok(Completion::done())
        })
        .await;
        assert!(report.passed());
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_returned_error_is_exception() {
        let report = run(|_: &Reporter, _: &Arc<Document>, _: &RuleContext| -> anyhow::Result<Completion> {
            anyhow::bail!("Foo")
        })
        .await;
        assert_eq!(report.exceptions.len(), 1);
        assert_eq!(report.exceptions[0].message, "custom: Foo");
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_panic_is_exception() {
        let report = run(|_: &Reporter, _: &Arc<Document>, _: &RuleContext| -> anyhow::Result<Completion> {
            panic!("Foo")
        })
        .await;
        assert_eq!(report.exceptions.len(), 1);
        assert_eq!(report.exceptions[0].message, "custom: Foo");
    }

    #[tokio::test]
    async fn test_returned_findings_become_errors() {
        let report = run(|reporter: &Reporter, document: &Arc<Document>, _: &RuleContext| -> anyhow::Result<Completion> {
            reporter.error("reported");
            let g = document.elements().find(|n| n.name() == "g").map(|n| n.id());
            let mut findings = Findings::from(Finding::new("returned"));
            if let Some(g) = g {
                findings.push(Finding::at("returned at g", document.node_ref(g)));
            }
            Ok(findings.into())
        })
        .await;

        let messages: Vec<_> = report.errors.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["custom: reported", "custom: returned", "custom: returned at g"]
        );
        assert!(report.errors[2].node.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_report_is_awaited() {
        let report = run(|reporter: &Reporter, _: &Arc<Document>, _: &RuleContext| -> anyhow::Result<Completion> {
            let reporter = reporter.clone();
            Ok(Completion::deferred(async move {
                tokio::time::sleep(Duration::from_millis(250)).await;
                reporter.error("Fails");
                Ok(Findings::none())
            }))
        })
        .await;
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].message, "custom: Fails");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_failure_is_exception() {
        let report = run(|_: &Reporter, _: &Arc<Document>, _: &RuleContext| -> anyhow::Result<Completion> {
            Ok(Completion::deferred(async {
                tokio::time::sleep(Duration::from_millis(250)).await;
                Err(anyhow::anyhow!("late failure"))
            }))
        })
        .await;
        assert_eq!(report.exceptions.len(), 1);
        assert_eq!(report.exceptions[0].message, "custom: late failure");
    }

    #[tokio::test]
    async fn test_deferred_panic_is_exception() {
        let report = run(|_: &Reporter, _: &Arc<Document>, _: &RuleContext| -> anyhow::Result<Completion> {
            Ok(Completion::deferred(async {
                tokio::task::yield_now().await;
                panic!("late panic");
            }))
        })
        .await;
        assert_eq!(report.exceptions.len(), 1);
        assert!(report.exceptions[0].message.contains("late panic"));
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "rule panicked");
    }
}
