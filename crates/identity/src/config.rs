// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Naming configuration
//!
//! Controls how resolved task names are shortened for display.

use serde::{Deserialize, Serialize};

use crate::error::NamingError;
use crate::rules::TRUNCATION_MARKER;

/// Default cap on `short_name` length
pub const DEFAULT_SHORT_NAME_MAX_LEN: usize = 50;

/// One user-supplied tree-name rewrite, applied after the built-in rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Regular expression to search for
    pub pattern: String,
    /// Replacement text (may use `$1`-style capture references)
    pub replacement: String,
}

impl RuleSpec {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// Display-name settings shared by every identifier of one table set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Names longer than this are cut and end with `...`
    pub short_name_max_len: usize,

    /// When false, `tree_name` returns the resolved name untouched
    pub use_short_task_names: bool,

    /// Append ` [file:line]` to names resolved from addresses
    pub include_source_location: bool,

    /// Extra rewrites applied after the built-in framework rules
    pub extra_tree_rules: Vec<RuleSpec>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            short_name_max_len: DEFAULT_SHORT_NAME_MAX_LEN,
            use_short_task_names: true,
            include_source_location: false,
            extra_tree_rules: Vec::new(),
        }
    }
}

impl NamingConfig {
    /// Create the default naming configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_short_name_max_len(mut self, len: usize) -> Self {
        self.short_name_max_len = len;
        self
    }

    pub fn with_short_task_names(mut self, enabled: bool) -> Self {
        self.use_short_task_names = enabled;
        self
    }

    pub fn with_source_location(mut self, enabled: bool) -> Self {
        self.include_source_location = enabled;
        self
    }

    /// Add an extra tree-name rule
    pub fn with_tree_rule(
        mut self,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        self.extra_tree_rules.push(RuleSpec::new(pattern, replacement));
        self
    }

    /// Validate the configuration
    ///
    /// Checks that the short-name threshold can hold the truncation marker
    /// and that every extra rule compiles.
    pub fn validate(&self) -> Result<(), NamingError> {
        if self.short_name_max_len <= TRUNCATION_MARKER.len() {
            return Err(NamingError::ShortNameTooSmall {
                min: TRUNCATION_MARKER.len() + 1,
                actual: self.short_name_max_len,
            });
        }

        for rule in &self.extra_tree_rules {
            regex::Regex::new(&rule.pattern).map_err(|source| NamingError::InvalidPattern {
                pattern: rule.pattern.clone(),
                source,
            })?;
        }

        Ok(())
    }
}
