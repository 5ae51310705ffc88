//! svglint - Rule-based SVG Linter
//!
//! Lints SVG documents against a configurable set of rules and produces a
//! pass/fail verdict plus the diagnostics that led to it.
//!
//! # Architecture
//!
//! ```text
//! Linter -> Document -> RulesConfig -> RuleRegistry -> executor -> RunReport
//! ```
//!
//! The linter parses the input once, expands the rule configuration into
//! rule instances, resolves each instance through the registry and runs all
//! of them concurrently. Every instance reports through its own
//! [`Reporter`]; a rule that errors or panics only affects itself.
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use svglint::{Linter, RulesConfig};
//!
//! # async fn demo() {
//! let rules = RulesConfig::new()
//!     .rule("elm", json!({"g": false}))
//!     .rule("attr", json!({"rule::selector": "svg", "role": true}));
//!
//! match Linter::new(rules).lint("icons/logo.svg").await {
//!     Ok(()) => println!("ok"),
//!     Err(issues) => issues.iter().for_each(|issue| println!("{}", issue)),
//! }
//! # }
//! ```

pub mod config;
pub mod diagnostic;
pub mod document;
pub mod engine;
pub mod executor;
pub mod output;
pub mod registry;
pub mod reporter;
pub mod rule;
pub mod rules;

// Re-export main types
pub use config::{Config, ConfigError, RuleInstance, RuleOptions, RuleSetting, RulesConfig};
pub use diagnostic::{Diagnostic, Issue, Message, ParseFailure, RuleException, Severity};
pub use document::{Document, Node, NodeId, NodeKind, NodeRef, ParseError, Selector};
pub use engine::Linter;
pub use output::{FileReport, OutputFormatter};
pub use registry::{RuleFactory, RuleRegistry, RuleResolutionError};
pub use reporter::{ReportEvent, ReportListener, Reporter, RunReport};
pub use rule::{Completion, Finding, Findings, Rule, RuleContext};
