// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Profiler Configuration
//!
//! [`ProfilerConfig`] bundles naming and reduction settings. It can be
//! built in code, read from a JSON settings payload, read from YAML, or
//! overridden from the environment.
//!
//! ## Example
//!
//! ```rust
//! use taskprof::ProfilerConfig;
//!
//! let config = ProfilerConfig::from_yaml_str(
//!     "naming:\n  short_name_max_len: 32\nreducer:\n  abort_on_failure: false\n",
//! )
//! .unwrap();
//! assert_eq!(config.naming.short_name_max_len, 32);
//! assert!(!config.reducer.abort_on_failure);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskprof_identity::{NamingConfig, NamingError};
use taskprof_reducer::ReducerConfig;

/// Settings key holding the profiler section
pub const SETTINGS_KEY: &str = "taskprof";

pub const ENV_SHORT_NAME_MAX_LEN: &str = "TASKPROF_SHORT_NAME_MAX_LEN";
pub const ENV_USE_SHORT_TASK_NAMES: &str = "TASKPROF_USE_SHORT_TASK_NAMES";
pub const ENV_ROOT_TASK_NAME: &str = "TASKPROF_ROOT_TASK_NAME";
pub const ENV_ABORT_ON_FAILURE: &str = "TASKPROF_ABORT_ON_FAILURE";

/// Complete profiler configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    pub naming: NamingConfig,
    pub reducer: ReducerConfig,
}

impl ProfilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_naming(mut self, naming: NamingConfig) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_reducer(mut self, reducer: ReducerConfig) -> Self {
        self.reducer = reducer;
        self
    }

    /// Parse the `taskprof` section of a settings payload
    ///
    /// Expected shape:
    /// {
    ///   "taskprof": {
    ///     "naming": { "short_name_max_len": 50, ... },
    ///     "reducer": { "root_task_name": "...", ... }
    ///   }
    /// }
    ///
    /// A payload without the section yields the defaults.
    pub fn from_settings(settings: &Value) -> Result<Self, ConfigError> {
        let Some(section) = settings.get(SETTINGS_KEY) else {
            return Ok(Self::default());
        };
        let config: Self = serde_json::from_value(section.clone())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document holding the profiler section's fields
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Override fields from the process environment
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Override fields from `lookup`, which maps variable names to values
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_SHORT_NAME_MAX_LEN) {
            self.naming.short_name_max_len =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    key: ENV_SHORT_NAME_MAX_LEN,
                    value: value.clone(),
                })?;
        }
        if let Some(value) = lookup(ENV_USE_SHORT_TASK_NAMES) {
            self.naming.use_short_task_names = parse_flag(ENV_USE_SHORT_TASK_NAMES, &value)?;
        }
        if let Some(value) = lookup(ENV_ROOT_TASK_NAME) {
            self.reducer.root_task_name = value;
        }
        if let Some(value) = lookup(ENV_ABORT_ON_FAILURE) {
            self.reducer.abort_on_failure = parse_flag(ENV_ABORT_ON_FAILURE, &value)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    ///
    /// Checks that:
    /// - The short-name threshold can hold the truncation marker
    /// - Every extra tree-name rule compiles
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.naming.validate()?;
        Ok(())
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            key,
            value: value.to_string(),
        }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Settings payload does not match the configuration shape
    #[error("Invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML document does not match the configuration shape
    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Environment variable holds an unusable value
    #[error("Invalid value '{value}' for {key}")]
    InvalidEnv { key: &'static str, value: String },

    /// Naming settings failed validation
    #[error("Invalid naming configuration: {0}")]
    Naming(#[from] NamingError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_settings() {
        let settings = json!({
            "taskprof": {
                "naming": { "short_name_max_len": 20, "use_short_task_names": false },
                "reducer": { "root_task_name": "main" }
            }
        });
        let config = ProfilerConfig::from_settings(&settings).unwrap();
        assert_eq!(config.naming.short_name_max_len, 20);
        assert!(!config.naming.use_short_task_names);
        assert_eq!(config.reducer.root_task_name, "main");
        assert!(config.reducer.abort_on_failure);
    }

    #[test]
    fn test_from_settings_without_section() {
        let config = ProfilerConfig::from_settings(&json!({ "other": {} })).unwrap();
        assert_eq!(config, ProfilerConfig::default());
    }

    #[test]
    fn test_from_settings_rejects_wrong_types() {
        let settings = json!({ "taskprof": { "naming": { "short_name_max_len": "long" } } });
        assert!(matches!(
            ProfilerConfig::from_settings(&settings),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_from_yaml_with_rules() {
        let yaml = r#"
naming:
  extra_tree_rules:
    - pattern: "my_namespace::"
      replacement: ""
"#;
        let config = ProfilerConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.naming.extra_tree_rules.len(), 1);
        assert_eq!(config.naming.extra_tree_rules[0].pattern, "my_namespace::");
    }

    #[test]
    fn test_yaml_rejects_bad_rule() {
        let yaml = "naming:\n  extra_tree_rules:\n    - pattern: \"(unclosed\"\n      replacement: x\n";
        assert!(matches!(
            ProfilerConfig::from_yaml_str(yaml),
            Err(ConfigError::Naming(_))
        ));
    }

    #[test]
    fn test_apply_env_overrides() {
        let config = ProfilerConfig::default()
            .apply_env_from(env(&[
                (ENV_SHORT_NAME_MAX_LEN, "64"),
                (ENV_USE_SHORT_TASK_NAMES, "off"),
                (ENV_ROOT_TASK_NAME, "APP MAIN"),
                (ENV_ABORT_ON_FAILURE, "false"),
            ]))
            .unwrap();

        assert_eq!(config.naming.short_name_max_len, 64);
        assert!(!config.naming.use_short_task_names);
        assert_eq!(config.reducer.root_task_name, "APP MAIN");
        assert!(!config.reducer.abort_on_failure);
    }

    #[test]
    fn test_apply_env_rejects_bad_values() {
        let result = ProfilerConfig::default().apply_env_from(env(&[(ENV_ABORT_ON_FAILURE, "maybe")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv { key: ENV_ABORT_ON_FAILURE, .. })
        ));

        let result = ProfilerConfig::default().apply_env_from(env(&[(ENV_SHORT_NAME_MAX_LEN, "2")]));
        assert!(matches!(result, Err(ConfigError::Naming(_))));
    }
}
