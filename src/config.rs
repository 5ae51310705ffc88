//! Rule configuration and config file loading
//!
//! Rule configuration maps a rule name to `false` (disabled), one config
//! value, or a list of config values where each value becomes its own rule
//! instance. File configuration is read from:
//! - `.svglintrc.yaml` / `.svglintrc.yml` / `.svglintrc.json` (project-level)
//! - the same names in the home directory (user-level)

use crate::rule::{Completion, Rule, RuleContext};
use crate::{document::Document, reporter::Reporter};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// One configuration value for one rule instance
#[derive(Clone)]
pub enum RuleOptions {
    /// Plain data, as read from a config file
    Value(Value),
    /// A rule given directly, used by `custom`
    Check(Arc<dyn Rule>),
}

impl RuleOptions {
    /// Wrap a closure as a custom check
    pub fn check<F>(check: F) -> Self
    where
        F: Fn(&Reporter, &Arc<Document>, &RuleContext) -> anyhow::Result<Completion>
            + Send
            + Sync
            + 'static,
    {
        RuleOptions::Check(Arc::new(check))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            RuleOptions::Value(value) => Some(value),
            RuleOptions::Check(_) => None,
        }
    }
}

impl fmt::Debug for RuleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleOptions::Value(value) => write!(f, "{}", value),
            RuleOptions::Check(_) => f.write_str("<check>"),
        }
    }
}

impl From<Value> for RuleOptions {
    fn from(value: Value) -> Self {
        RuleOptions::Value(value)
    }
}

/// Setting for one rule name
#[derive(Debug, Clone)]
pub enum RuleSetting {
    /// `false`: the rule is not applied
    Disabled,
    /// A single config value: one instance
    One(RuleOptions),
    /// A list of config values: one instance per value
    Many(Vec<RuleOptions>),
}

impl RuleSetting {
    pub fn is_disabled(&self) -> bool {
        matches!(self, RuleSetting::Disabled)
    }
}

impl From<Value> for RuleSetting {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(false) => RuleSetting::Disabled,
            Value::Array(items) => {
                RuleSetting::Many(items.into_iter().map(RuleOptions::Value).collect())
            }
            other => RuleSetting::One(RuleOptions::Value(other)),
        }
    }
}

impl From<RuleOptions> for RuleSetting {
    fn from(options: RuleOptions) -> Self {
        RuleSetting::One(options)
    }
}

impl From<Vec<RuleOptions>> for RuleSetting {
    fn from(options: Vec<RuleOptions>) -> Self {
        RuleSetting::Many(options)
    }
}

impl<'de> Deserialize<'de> for RuleSetting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(RuleSetting::from)
    }
}

/// A rule name paired with one config value
#[derive(Debug, Clone)]
pub struct RuleInstance {
    pub name: String,
    pub options: RuleOptions,
}

/// Rule configuration, keeping rule names in insertion order
#[derive(Debug, Clone, Default)]
pub struct RulesConfig {
    entries: Vec<(String, RuleSetting)>,
}

impl RulesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`RulesConfig::set`]
    pub fn rule(mut self, name: &str, setting: impl Into<RuleSetting>) -> Self {
        self.set(name, setting);
        self
    }

    /// Set a rule, replacing an existing setting in place
    pub fn set(&mut self, name: &str, setting: impl Into<RuleSetting>) {
        let setting = setting.into();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = setting,
            None => self.entries.push((name.to_string(), setting)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RuleSetting> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleSetting)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge another config into this one (other takes precedence, including
    /// `false`)
    pub fn merge(&mut self, other: RulesConfig) {
        for (name, setting) in other.entries {
            self.set(&name, setting);
        }
    }

    /// Expand into rule instances: rule names in insertion order, then list
    /// order within a name. Disabled rules yield nothing.
    pub fn instances(&self) -> Vec<RuleInstance> {
        let mut instances = Vec::new();
        for (name, setting) in &self.entries {
            let options: &[RuleOptions] = match setting {
                RuleSetting::Disabled => &[],
                RuleSetting::One(options) => std::slice::from_ref(options),
                RuleSetting::Many(options) => options,
            };
            instances.extend(options.iter().map(|options| RuleInstance {
                name: name.clone(),
                options: options.clone(),
            }));
        }
        instances
    }
}

impl<'de> Deserialize<'de> for RulesConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RulesVisitor;

        impl<'de> Visitor<'de> for RulesVisitor {
            type Value = RulesConfig;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of rule names to rule configs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RulesConfig, A::Error> {
                let mut rules = RulesConfig::new();
                while let Some((name, setting)) = map.next_entry::<String, RuleSetting>()? {
                    rules.set(&name, setting);
                }
                Ok(rules)
            }
        }

        deserializer.deserialize_map(RulesVisitor)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Other configuration files to load first
    pub extends: Vec<String>,

    /// Rule configuration
    pub rules: RulesConfig,

    /// Glob patterns of files the CLI skips
    pub ignore: Vec<String>,
}

impl Config {
    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_depth(path, 0)
    }

    /// Load with recursion depth limit (to prevent infinite loops)
    fn load_with_depth(path: &Path, depth: usize) -> Result<Self, ConfigError> {
        const MAX_DEPTH: usize = 10;
        if depth >= MAX_DEPTH {
            return Err(ConfigError::Invalid(
                "Maximum config inheritance depth exceeded".to_string(),
            ));
        }

        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let mut config: Self = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "Unknown config file format: {}",
                    ext
                )))
            }
        };

        if !config.extends.is_empty() {
            let base_dir = path.parent().unwrap_or(Path::new("."));
            let mut base_config = Self::default();

            for extend in &config.extends {
                let extend_path = if Path::new(extend).is_absolute() {
                    PathBuf::from(extend)
                } else {
                    base_dir.join(extend)
                };
                base_config.merge(Self::load_with_depth(&extend_path, depth + 1)?);
            }

            base_config.merge(std::mem::take(&mut config));
            config = base_config;
        }

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Self) {
        // Extends are not inherited
        self.rules.merge(other.rules);
        self.ignore.extend(other.ignore);
    }

    /// Load configuration from the first default location that exists
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_names = [".svglintrc.yaml", ".svglintrc.yml", ".svglintrc.json"];

        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Self::load(&path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            for name in &config_names {
                let path = home.join(name);
                if path.exists() {
                    return Self::load(&path);
                }
            }
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn summary(rules: &RulesConfig) -> Vec<(String, String)> {
        rules
            .instances()
            .into_iter()
            .map(|i| (i.name, format!("{:?}", i.options)))
            .collect()
    }

    #[test]
    fn test_instances_order_and_fan_out() {
        let rules = RulesConfig::new()
            .rule("elm", json!({"g": 0}))
            .rule("attr", json!([{"role": true}, {"viewBox": true}]))
            .rule("custom", json!([]));

        assert_eq!(
            summary(&rules),
            vec![
                ("elm".to_string(), r#"{"g":0}"#.to_string()),
                ("attr".to_string(), r#"{"role":true}"#.to_string()),
                ("attr".to_string(), r#"{"viewBox":true}"#.to_string()),
            ]
        );
    }

    #[test]
    fn test_disabled_yields_nothing() {
        let rules = RulesConfig::new()
            .rule("elm", json!(false))
            .rule("attr", json!({"role": true}));
        assert!(rules.get("elm").unwrap().is_disabled());
        assert_eq!(rules.instances().len(), 1);
        assert_eq!(rules.instances()[0].name, "attr");
    }

    #[test]
    fn test_instances_do_not_mutate_config() {
        let rules = RulesConfig::new().rule("attr", json!([{"a": true}]));
        let first = summary(&rules);
        let second = summary(&rules);
        assert_eq!(first, second);
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_merge_false_overrides() {
        let mut base = RulesConfig::new()
            .rule("elm", json!({"g": 0}))
            .rule("attr", json!({"role": true}));
        base.merge(RulesConfig::new().rule("elm", json!(false)));

        assert!(base.get("elm").unwrap().is_disabled());
        let names: Vec<_> = base.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["elm", "attr"]);
    }

    #[test]
    fn test_yaml_keeps_key_order() {
        let yaml = r#"
rules:
  valid: true
  elm:
    g: 0
  attr:
    - role: true
    - rule::selector: path
      d: true
  custom: false
ignore:
  - "**/dist/**"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<_> = config.rules.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["valid", "elm", "attr", "custom"]);
        assert_eq!(config.rules.instances().len(), 4);
        assert_eq!(config.ignore, vec!["**/dist/**"]);
    }

    #[test]
    fn test_json_config() {
        let config: Config =
            serde_json::from_str(r#"{"rules": {"b": {"x": 1}, "a": [1, 2]}}"#).unwrap();
        let instances = config.rules.instances();
        assert_eq!(instances.len(), 3);
        assert_eq!(instances[0].name, "b");
        assert_eq!(instances[2].options.as_value(), Some(&json!(2)));
    }

    #[test]
    fn test_load_with_extends() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("base.yaml"),
            "rules:\n  elm:\n    g: 0\n  attr:\n    role: true\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(".svglintrc.json"),
            r#"{"extends": ["base.yaml"], "rules": {"attr": false}}"#,
        )
        .unwrap();

        let config = Config::load(&dir.path().join(".svglintrc.json")).unwrap();
        assert!(config.rules.get("attr").unwrap().is_disabled());
        let instances = config.rules.instances();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].name, "elm");
    }

    #[test]
    fn test_load_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
    }
}
