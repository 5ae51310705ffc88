//! Rule contract: what a rule receives and what it may return

use crate::diagnostic::Message;
use crate::document::{Document, NodeRef};
use crate::reporter::Reporter;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

/// An error a rule returns directly instead of reporting it
#[derive(Debug, Clone)]
pub struct Finding {
    pub message: Message,
    pub node: Option<NodeRef>,
}

impl Finding {
    pub fn new(message: impl Into<Message>) -> Self {
        Self {
            message: message.into(),
            node: None,
        }
    }

    pub fn at(message: impl Into<Message>, node: NodeRef) -> Self {
        Self {
            message: message.into(),
            node: Some(node),
        }
    }
}

/// Errors returned directly by a rule. Empty means "no findings".
#[derive(Debug, Clone, Default)]
pub struct Findings(Vec<Finding>);

impl Findings {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        self.0.push(finding);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Finding> for Findings {
    fn from(finding: Finding) -> Self {
        Self(vec![finding])
    }
}

impl From<Vec<Finding>> for Findings {
    fn from(findings: Vec<Finding>) -> Self {
        Self(findings)
    }
}

impl FromIterator<Finding> for Findings {
    fn from_iter<I: IntoIterator<Item = Finding>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Findings {
    type Item = Finding;
    type IntoIter = std::vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Work a rule finishes after returning
pub type DeferredCheck = BoxFuture<'static, anyhow::Result<Findings>>;

/// How a rule completes: right away, or once a future settles
pub enum Completion {
    Immediate(Findings),
    Deferred(DeferredCheck),
}

impl Completion {
    /// Finished with nothing to return
    pub fn done() -> Self {
        Completion::Immediate(Findings::none())
    }

    /// Finish once `future` resolves; the run waits for it
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<Findings>> + Send + 'static,
    {
        Completion::Deferred(future.boxed())
    }
}

impl From<Findings> for Completion {
    fn from(findings: Findings) -> Self {
        Completion::Immediate(findings)
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Completion::Immediate(findings) => f.debug_tuple("Immediate").field(findings).finish(),
            Completion::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Information about the input being linted
#[derive(Debug, Clone, Default)]
pub struct RuleContext {
    /// Path of the linted file, `None` when the input was literal text
    pub filepath: Option<PathBuf>,
}

/// A configured rule, ready to check documents.
///
/// Rules report through the [`Reporter`], may also return [`Findings`]
/// directly, and signal unexpected failures by returning an error (or
/// panicking). A failure only affects the failing rule.
pub trait Rule: Send + Sync {
    fn check(
        &self,
        reporter: &Reporter,
        document: &Arc<Document>,
        context: &RuleContext,
    ) -> anyhow::Result<Completion>;
}

impl<F> Rule for F
where
    F: Fn(&Reporter, &Arc<Document>, &RuleContext) -> anyhow::Result<Completion> + Send + Sync,
{
    fn check(
        &self,
        reporter: &Reporter,
        document: &Arc<Document>,
        context: &RuleContext,
    ) -> anyhow::Result<Completion> {
        self(reporter, document, context)
    }
}
