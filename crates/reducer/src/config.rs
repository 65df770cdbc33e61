// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Reducer configuration

use serde::{Deserialize, Serialize};

/// Name of the internal bookkeeping task that wraps a whole run
pub const DEFAULT_ROOT_TASK_NAME: &str = "TASKPROF MAIN";

/// Reduction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Task excluded from the reduction
    pub root_task_name: String,

    /// Abort the process on a collective failure instead of returning it
    pub abort_on_failure: bool,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            root_task_name: DEFAULT_ROOT_TASK_NAME.to_string(),
            abort_on_failure: true,
        }
    }
}

impl ReducerConfig {
    pub fn with_root_task_name(mut self, name: impl Into<String>) -> Self {
        self.root_task_name = name.into();
        self
    }

    pub fn with_abort_on_failure(mut self, abort: bool) -> Self {
        self.abort_on_failure = abort;
        self
    }

    /// Whether `name` is the excluded bookkeeping task
    pub fn is_root_task(&self, name: &str) -> bool {
        !self.root_task_name.is_empty() && name == self.root_task_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReducerConfig::default();
        assert_eq!(config.root_task_name, "TASKPROF MAIN");
        assert!(config.abort_on_failure);
        assert!(config.is_root_task("TASKPROF MAIN"));
    }

    #[test]
    fn test_empty_root_name_excludes_nothing() {
        let config = ReducerConfig::default().with_root_task_name("");
        assert!(!config.is_root_task(""));
    }
}
