// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock registry implementation for testing
//!
//! Holds records built from exact snapshots, so tests can state the
//! statistics a participant reports instead of replaying samples.

use std::sync::Arc;

use taskprof_identity::{IdentityTables, TaskId};
use taskprof_profile::{ProfileRecord, ProfileRegistry, ProfileSnapshot};

use crate::fixtures::ProfileFixtures;

/// In-memory registry that enumerates tasks in insertion order
///
/// A task may be known without a profile, which a real registry reports
/// while a record is still being created.
#[derive(Debug, Default)]
pub struct MockRegistry {
    entries: Vec<(TaskId, Option<Arc<ProfileRecord>>)>,
}

impl MockRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a builder that names tasks through `tables`
    pub fn builder(tables: &IdentityTables) -> MockRegistryBuilder<'_> {
        MockRegistryBuilder::new(tables)
    }

    /// Add a task with the given statistics, replacing an earlier entry
    pub fn add(&mut self, task: TaskId, snapshot: ProfileSnapshot) {
        let record = Some(Arc::new(ProfileRecord::from_snapshot(snapshot)));
        match self.entries.iter_mut().find(|(known, _)| *known == task) {
            Some(entry) => entry.1 = record,
            None => self.entries.push((task, record)),
        }
    }

    /// Add a task that is known but has no profile
    pub fn add_without_profile(&mut self, task: TaskId) {
        if !self.entries.iter().any(|(known, _)| *known == task) {
            self.entries.push((task, None));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProfileRegistry for MockRegistry {
    fn enumerate_known_tasks(&self) -> Vec<TaskId> {
        self.entries.iter().map(|(task, _)| *task).collect()
    }

    fn lookup_profile(&self, task: TaskId) -> Option<Arc<ProfileRecord>> {
        self.entries
            .iter()
            .find(|(known, _)| *known == task)
            .and_then(|(_, record)| record.clone())
    }
}

/// Builder for creating a mock registry
pub struct MockRegistryBuilder<'a> {
    tables: &'a IdentityTables,
    registry: MockRegistry,
}

impl<'a> MockRegistryBuilder<'a> {
    /// Create a new builder
    pub fn new(tables: &'a IdentityTables) -> Self {
        Self {
            tables,
            registry: MockRegistry::new(),
        }
    }

    /// Add a timer with `calls` equal samples summing to `accumulated`
    pub fn with_timer(self, name: &str, calls: u64, accumulated: f64) -> Self {
        self.with_snapshot(name, ProfileFixtures::timer(calls, accumulated))
    }

    /// Add a counter with `samples` samples summing to `total`
    pub fn with_counter(self, name: &str, samples: u64, total: f64) -> Self {
        self.with_snapshot(name, ProfileFixtures::counter(samples, total))
    }

    /// Add a task with arbitrary statistics
    pub fn with_snapshot(mut self, name: &str, snapshot: ProfileSnapshot) -> Self {
        let task = self.tables.get_or_create_name(name);
        self.registry.add(task, snapshot);
        self
    }

    /// Add an address-identified task with arbitrary statistics
    pub fn with_address(mut self, address: usize, snapshot: ProfileSnapshot) -> Self {
        let task = self.tables.get_or_create_address(address);
        self.registry.add(task, snapshot);
        self
    }

    /// Add a task with no profile
    pub fn with_unprofiled(mut self, name: &str) -> Self {
        let task = self.tables.get_or_create_name(name);
        self.registry.add_without_profile(task);
        self
    }

    /// Build the registry
    pub fn build(self) -> MockRegistry {
        self.registry
    }
}
