//! Built-in rules
//!
//! Each rule exposes a `factory` that validates one config value and returns
//! the configured rule, ready to be registered in a
//! [`RuleRegistry`](crate::registry::RuleRegistry).

pub mod attr;
pub mod custom;
pub mod elm;

use crate::config::RuleOptions;
use crate::document::Selector;
use crate::registry::RuleResolutionError;
use serde_json::{Map, Value};

/// The config value as a JSON object, or an invalid-config error
fn object_options<'a>(
    rule: &str,
    options: &'a RuleOptions,
) -> Result<&'a Map<String, Value>, RuleResolutionError> {
    match options.as_value() {
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(RuleResolutionError::invalid_config(
            rule,
            format!("expected an object, got {}", other),
        )),
        None => Err(RuleResolutionError::invalid_config(
            rule,
            "expected an object, got a check function",
        )),
    }
}

fn parse_selector(rule: &str, selector: &str) -> Result<Selector, RuleResolutionError> {
    Selector::parse(selector).map_err(|e| RuleResolutionError::invalid_config(rule, e.to_string()))
}
