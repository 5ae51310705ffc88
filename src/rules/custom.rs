//! `custom`: runs a check supplied programmatically
//!
//! ```ignore
//! let rules = RulesConfig::new().rule(
//!     "custom",
//!     RuleOptions::check(|reporter, document, _ctx| {
//!         if document.root().name() != "svg" {
//!             reporter.error("Root is not <svg>");
//!         }
//!         Ok(Completion::done())
//!     }),
//! );
//! ```

use crate::config::RuleOptions;
use crate::registry::RuleResolutionError;
use crate::rule::Rule;
use std::sync::Arc;

pub fn factory(options: &RuleOptions) -> Result<Arc<dyn Rule>, RuleResolutionError> {
    match options {
        RuleOptions::Check(rule) => Ok(Arc::clone(rule)),
        RuleOptions::Value(value) => Err(RuleResolutionError::invalid_config(
            "custom",
            format!("expected a check function, got {}", value),
        )),
    }
}
