//! Rule registry: resolves rule names to configured rules

use crate::config::RuleOptions;
use crate::rule::Rule;
use crate::rules;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

/// A rule name could not be turned into a runnable rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleResolutionError {
    #[error("Unknown rule ({0})")]
    Unknown(String),

    #[error("Invalid config for rule ({rule}): {message}")]
    InvalidConfig { rule: String, message: String },

    #[error("Failed to load rule ({rule}): {message}")]
    Failed { rule: String, message: String },
}

impl RuleResolutionError {
    pub fn invalid_config(rule: &str, message: impl Into<String>) -> Self {
        RuleResolutionError::InvalidConfig {
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}

/// Builds a rule from one config value
pub type RuleFactory =
    Arc<dyn Fn(&RuleOptions) -> Result<Arc<dyn Rule>, RuleResolutionError> + Send + Sync>;

/// Registry of all available rules, keyed by name
#[derive(Clone, Default)]
pub struct RuleRegistry {
    factories: HashMap<String, RuleFactory>,
}

impl RuleRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in rules registered.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("attr", rules::attr::factory);
        registry.register("elm", rules::elm::factory);
        registry.register("custom", rules::custom::factory);
        registry
    }

    /// Registers a rule factory, replacing any rule with the same name.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&RuleOptions) -> Result<Arc<dyn Rule>, RuleResolutionError> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered rule names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Build the rule `name` bound to `options`.
    ///
    /// A factory that panics is reported as [`RuleResolutionError::Failed`].
    pub fn resolve(
        &self,
        name: &str,
        options: &RuleOptions,
    ) -> Result<Arc<dyn Rule>, RuleResolutionError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RuleResolutionError::Unknown(name.to_string()))?;

        panic::catch_unwind(AssertUnwindSafe(|| (**factory)(options))).unwrap_or_else(|payload| {
            Err(RuleResolutionError::Failed {
                rule: name.to_string(),
                message: crate::executor::panic_message(payload.as_ref()),
            })
        })
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.names())
            .finish()
    }
}
