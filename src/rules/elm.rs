//! `elm`: which elements must, may, or must not exist
//!
//! The config maps selectors to an expectation:
//!
//! | value        | meaning                                   |
//! |--------------|-------------------------------------------|
//! | `true`       | at least one match                        |
//! | `false`, `0` | no matches; each match is an error        |
//! | `n`          | exactly `n` matches                       |
//! | `[min, max]` | between `min` and `max` matches inclusive |
//!
//! An element matched by a selector that allows it is exempt from
//! selectors that disallow it, so `{"*": false, "svg": true}` means "only
//! `<svg>`".

use super::{object_options, parse_selector};
use crate::config::RuleOptions;
use crate::document::{Document, NodeId, Selector};
use crate::registry::RuleResolutionError;
use crate::reporter::Reporter;
use crate::rule::{Completion, Rule, RuleContext};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

const NAME: &str = "elm";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Present,
    Disallowed,
    Exactly(u64),
    Between(u64, u64),
}

impl Expect {
    fn from_value(selector: &str, value: &Value) -> Result<Self, RuleResolutionError> {
        let invalid = || {
            RuleResolutionError::invalid_config(
                NAME,
                format!("unsupported value {} for '{}'", value, selector),
            )
        };
        match value {
            Value::Bool(true) => Ok(Expect::Present),
            Value::Bool(false) => Ok(Expect::Disallowed),
            Value::Number(n) => match n.as_u64() {
                Some(0) => Ok(Expect::Disallowed),
                Some(n) => Ok(Expect::Exactly(n)),
                None => Err(invalid()),
            },
            Value::Array(range) => match range.as_slice() {
                [min, max] => {
                    let (min, max) = min
                        .as_u64()
                        .zip(max.as_u64())
                        .filter(|(min, max)| min <= max)
                        .ok_or_else(invalid)?;
                    Ok(Expect::Between(min, max))
                }
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }

    fn allows(&self) -> bool {
        !matches!(self, Expect::Disallowed)
    }
}

/// Configured `elm` rule
#[derive(Debug)]
pub struct ElmRule {
    checks: Vec<(Selector, Expect)>,
}

pub fn factory(options: &RuleOptions) -> Result<Arc<dyn Rule>, RuleResolutionError> {
    let map = object_options(NAME, options)?;
    let checks = map
        .iter()
        .map(|(selector, value)| {
            Ok((
                parse_selector(NAME, selector)?,
                Expect::from_value(selector, value)?,
            ))
        })
        .collect::<Result<Vec<_>, RuleResolutionError>>()?;
    Ok(Arc::new(ElmRule { checks }))
}

impl Rule for ElmRule {
    fn check(
        &self,
        reporter: &Reporter,
        document: &Arc<Document>,
        _context: &RuleContext,
    ) -> anyhow::Result<Completion> {
        let matched: Vec<Vec<NodeId>> = self
            .checks
            .iter()
            .map(|(selector, _)| document.select(selector).iter().map(|n| n.id()).collect())
            .collect();

        let allowed: HashSet<NodeId> = self
            .checks
            .iter()
            .zip(&matched)
            .filter(|((_, expect), _)| expect.allows())
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();

        for ((selector, expect), ids) in self.checks.iter().zip(&matched) {
            let count = ids.len() as u64;
            match *expect {
                Expect::Present if count == 0 => {
                    reporter.error(format!("Expected '{}', none found", selector.as_str()));
                }
                Expect::Disallowed => {
                    for &id in ids.iter().filter(|id| !allowed.contains(id)) {
                        reporter.error_at(
                            format!("Element disallowed by '{}'", selector.as_str()),
                            document.node_ref(id),
                        );
                    }
                }
                Expect::Exactly(n) if count != n => {
                    reporter.error([
                        json!(format!("Found {} elements for '{}', expected", count, selector.as_str())),
                        json!(n),
                    ]);
                }
                Expect::Between(min, max) if count < min || count > max => {
                    reporter.error([
                        json!(format!("Found {} elements for '{}', expected", count, selector.as_str())),
                        json!([min, max]),
                    ]);
                }
                _ => {}
            }
        }

        Ok(Completion::done())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(svg: &str, config: Value) -> crate::reporter::RunReport {
        let rule = factory(&RuleOptions::Value(config)).unwrap();
        let document = Arc::new(Document::parse(svg).unwrap());
        let reporter = Reporter::new(NAME);
        rule.check(&reporter, &document, &RuleContext::default()).unwrap();
        reporter.take_report()
    }

    #[test]
    fn test_disallowed_element() {
        let report = run("<svg><g></g></svg>", json!({"g": 0}));
        assert_eq!(report.errors.len(), 1);
        let node = report.errors[0].node.as_ref().unwrap();
        assert_eq!(node.node().name(), "g");
        assert_eq!(report.errors[0].message, "elm: Element disallowed by 'g'");
    }

    #[test]
    fn test_false_reports_each_match() {
        let report = run("<svg><g/><g/><rect/></svg>", json!({"g": false}));
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_required_element() {
        assert!(run("<svg><title>x</title></svg>", json!({"title": true})).passed());
        let report = run("<svg/>", json!({"title": true}));
        assert_eq!(report.errors[0].message, "elm: Expected 'title', none found");
    }

    #[test]
    fn test_exact_count() {
        assert!(run("<svg><g/><g/></svg>", json!({"g": 2})).passed());
        let report = run("<svg><g/></svg>", json!({"g": 2}));
        assert_eq!(report.errors[0].message, "elm: Found 1 elements for 'g', expected 2");
    }

    #[test]
    fn test_range() {
        assert!(run("<svg><g/><g/></svg>", json!({"g": [1, 3]})).passed());
        let report = run("<svg/>", json!({"g": [1, 3]}));
        assert_eq!(report.errors[0].message, "elm: Found 0 elements for 'g', expected [1,3]");
    }

    #[test]
    fn test_allowed_elements_are_exempt() {
        let config = json!({"*": false, "svg": true, "svg > g": true});
        assert!(run("<svg><g/></svg>", config.clone()).passed());

        let report = run("<svg><g><rect/></g></svg>", config);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].node.as_ref().unwrap().node().name(), "rect");
    }

    #[test]
    fn test_invalid_config() {
        for config in [json!({"g": "yes"}), json!({"g": [3, 1]}), json!({"g": -1}), json!(true)] {
            let err = factory(&RuleOptions::Value(config)).err().unwrap();
            assert!(matches!(err, RuleResolutionError::InvalidConfig { .. }));
        }
        let err = factory(&RuleOptions::Value(json!({"g[": true}))).err().unwrap();
        assert!(err.to_string().contains("invalid selector"));
    }
}
