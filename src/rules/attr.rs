//! `attr`: constraints on the attributes of selected elements
//!
//! Attribute keys map to an expectation:
//!
//! - `true`: the attribute must be present
//! - `false`: the attribute must be absent
//! - `"/pattern/"`: present and matching the regular expression
//! - any other string or number: present and equal to it
//! - an array of strings: present and equal to one of them
//!
//! Keys prefixed with `rule::` configure the rule itself:
//!
//! - `rule::selector`: elements to check (default `*`)
//! - `rule::whitelist`: when `true`, attributes not listed are errors
//! - `rule::order`: `true` to require the listed attributes in config order,
//!   or an array giving the required order

use super::{object_options, parse_selector};
use crate::config::RuleOptions;
use crate::document::{Document, Node, Selector};
use crate::registry::RuleResolutionError;
use crate::reporter::Reporter;
use crate::rule::{Completion, Rule, RuleContext};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::Arc;

const NAME: &str = "attr";

#[derive(Debug, Clone)]
enum Expect {
    Present,
    Absent,
    Equals(String),
    Matches(Regex),
    OneOf(Vec<String>),
}

impl Expect {
    fn from_value(attr: &str, value: &Value) -> Result<Self, RuleResolutionError> {
        let invalid = || {
            RuleResolutionError::invalid_config(
                NAME,
                format!("unsupported value {} for attribute '{}'", value, attr),
            )
        };
        match value {
            Value::Bool(true) => Ok(Expect::Present),
            Value::Bool(false) => Ok(Expect::Absent),
            Value::Number(n) => Ok(Expect::Equals(n.to_string())),
            Value::String(s) if s.len() >= 2 && s.starts_with('/') && s.ends_with('/') => {
                let pattern = &s[1..s.len() - 1];
                Regex::new(pattern).map(Expect::Matches).map_err(|e| {
                    RuleResolutionError::invalid_config(
                        NAME,
                        format!("invalid pattern for attribute '{}': {}", attr, e),
                    )
                })
            }
            Value::String(s) => Ok(Expect::Equals(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
                .collect::<Result<Vec<_>, _>>()
                .map(Expect::OneOf),
            _ => Err(invalid()),
        }
    }

    /// Describe a mismatch of `value`, or `None` if it satisfies this
    fn violation(&self, attr: &str, value: Option<&str>) -> Option<Vec<Value>> {
        match (self, value) {
            (Expect::Absent, Some(_)) => {
                Some(vec![json!(format!("Attribute '{}' is disallowed", attr))])
            }
            (Expect::Absent, None) => None,
            (_, None) => Some(vec![json!(format!(
                "Expected attribute '{}', didn't find it",
                attr
            ))]),
            (Expect::Present, Some(_)) => None,
            (Expect::Equals(expected), Some(actual)) if expected != actual => Some(vec![
                json!(format!("Expected attribute '{}' to be", attr)),
                json!(expected),
                json!("but found"),
                json!(actual),
            ]),
            (Expect::Matches(pattern), Some(actual)) if !pattern.is_match(actual) => Some(vec![
                json!(format!("Expected attribute '{}' to match /{}/, found", attr, pattern)),
                json!(actual),
            ]),
            (Expect::OneOf(allowed), Some(actual)) if !allowed.iter().any(|a| a == actual) => {
                Some(vec![
                    json!(format!("Expected attribute '{}' to be one of", attr)),
                    json!(allowed),
                    json!("but found"),
                    json!(actual),
                ])
            }
            _ => None,
        }
    }
}

/// Configured `attr` rule
#[derive(Debug)]
pub struct AttrRule {
    selector: Selector,
    attrs: Vec<(String, Expect)>,
    whitelist: bool,
    order: Option<Vec<String>>,
}

pub fn factory(options: &RuleOptions) -> Result<Arc<dyn Rule>, RuleResolutionError> {
    let map = object_options(NAME, options)?;

    let mut selector = None;
    let mut whitelist = false;
    let mut order = None;
    let mut attrs = Vec::new();

    for (key, value) in map {
        match key.as_str() {
            "rule::selector" => {
                let text = value.as_str().ok_or_else(|| {
                    RuleResolutionError::invalid_config(NAME, "rule::selector must be a string")
                })?;
                selector = Some(parse_selector(NAME, text)?);
            }
            "rule::whitelist" => {
                whitelist = value.as_bool().ok_or_else(|| {
                    RuleResolutionError::invalid_config(NAME, "rule::whitelist must be a boolean")
                })?;
            }
            "rule::order" => order = Some(value.clone()),
            other if other.starts_with("rule::") => {
                return Err(RuleResolutionError::invalid_config(
                    NAME,
                    format!("unknown option '{}'", other),
                ));
            }
            attr => attrs.push((attr.to_string(), Expect::from_value(attr, value)?)),
        }
    }

    let order = match order {
        None | Some(Value::Bool(false)) => None,
        Some(Value::Bool(true)) => Some(attrs.iter().map(|(name, _)| name.clone()).collect()),
        Some(Value::Array(names)) => Some(
            names
                .iter()
                .map(|n| n.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| {
                    RuleResolutionError::invalid_config(NAME, "rule::order must list names")
                })?,
        ),
        Some(_) => {
            return Err(RuleResolutionError::invalid_config(
                NAME,
                "rule::order must be a boolean or an array",
            ))
        }
    };

    let selector = match selector {
        Some(selector) => selector,
        None => parse_selector(NAME, "*")?,
    };

    Ok(Arc::new(AttrRule {
        selector,
        attrs,
        whitelist,
        order,
    }))
}

impl AttrRule {
    fn check_order(&self, order: &[String], node: Node<'_>) -> Option<Vec<Value>> {
        let found: Vec<&str> = node
            .attributes()
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| order.iter().any(|o| o == name))
            .collect();
        let expected: Vec<&str> = order
            .iter()
            .map(String::as_str)
            .filter(|name| found.contains(name))
            .collect();

        if found == expected {
            return None;
        }
        Some(vec![
            json!("Wrong ordering of attributes, found"),
            json!(found),
            json!("expected"),
            json!(expected),
        ])
    }
}

impl Rule for AttrRule {
    fn check(
        &self,
        reporter: &Reporter,
        document: &Arc<Document>,
        _context: &RuleContext,
    ) -> anyhow::Result<Completion> {
        for node in document.select(&self.selector) {
            let at = || document.node_ref(node.id());

            for (attr, expect) in &self.attrs {
                if let Some(message) = expect.violation(attr, node.attr(attr)) {
                    reporter.error_at(message, at());
                }
            }

            if self.whitelist {
                for (name, _) in node.attributes() {
                    if !self.attrs.iter().any(|(attr, _)| attr == name) {
                        reporter.error_at(format!("Attribute '{}' not allowed", name), at());
                    }
                }
            }

            if let Some(order) = &self.order {
                if let Some(message) = self.check_order(order, node) {
                    reporter.error_at(message, at());
                }
            }
        }

        Ok(Completion::done())
    }
}
