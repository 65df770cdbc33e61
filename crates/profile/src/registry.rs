// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Profile registry
//!
//! The registry owns the mapping from task identity to profile record. The
//! reducer only needs the read side ([`ProfileRegistry`]); [`ProfileTable`]
//! is the in-process implementation that instrumentation writes into.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use taskprof_identity::TaskId;
use tracing::trace;

use crate::record::ProfileRecord;
use crate::sample::Sample;
use crate::snapshot::ProfileKind;

/// Read access to a set of profiles keyed by task identity
pub trait ProfileRegistry: Send + Sync {
    /// Every task with a profile, in a stable order
    fn enumerate_known_tasks(&self) -> Vec<TaskId>;

    /// The profile of one task, if it has been observed
    fn lookup_profile(&self, task: TaskId) -> Option<Arc<ProfileRecord>>;
}

/// Concurrent task → profile table
///
/// The first sample for a task creates its record; later samples increment
/// it. The map lock is released before incrementing, so samples for
/// different tasks only contend on map shards, never on each other's
/// records.
#[derive(Debug, Default)]
pub struct ProfileTable {
    profiles: DashMap<TaskId, Arc<ProfileRecord>>,
}

impl ProfileTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Route one sample to the task's record, creating it on first use
    pub fn record(
        &self,
        task: TaskId,
        kind: ProfileKind,
        sample: &Sample,
        thread_id: u64,
    ) -> Arc<ProfileRecord> {
        let existing = self.profiles.get(&task).map(|entry| Arc::clone(entry.value()));
        if let Some(profile) = existing {
            profile.increment(sample, thread_id);
            return profile;
        }

        let created = match self.profiles.entry(task) {
            Entry::Occupied(entry) => Err(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                trace!("Creating profile for {}", task);
                let profile = Arc::new(ProfileRecord::new_on_thread(kind, sample, thread_id));
                entry.insert(Arc::clone(&profile));
                Ok(profile)
            }
        };

        match created {
            Ok(profile) => profile,
            // lost the creation race; the shard lock is released by now
            Err(profile) => {
                profile.increment(sample, thread_id);
                profile
            }
        }
    }

    /// Insert a prebuilt record, replacing any existing one
    pub fn insert(&self, task: TaskId, profile: ProfileRecord) -> Arc<ProfileRecord> {
        let profile = Arc::new(profile);
        self.profiles.insert(task, Arc::clone(&profile));
        profile
    }

    pub fn get(&self, task: TaskId) -> Option<Arc<ProfileRecord>> {
        self.profiles.get(&task).map(|entry| Arc::clone(entry.value()))
    }

    /// Reset one task's record; returns false if the task has none
    pub fn reset(&self, task: TaskId) -> bool {
        match self.get(task) {
            Some(profile) => {
                profile.reset();
                true
            }
            None => false,
        }
    }

    /// Reset every record
    pub fn reset_all(&self) {
        for entry in self.profiles.iter() {
            entry.value().reset();
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl ProfileRegistry for ProfileTable {
    /// Tasks ordered by raw label, so every call sees the same order
    fn enumerate_known_tasks(&self) -> Vec<TaskId> {
        let mut tasks: Vec<(String, TaskId)> = self
            .profiles
            .iter()
            .map(|entry| (entry.key().get_name(false), *entry.key()))
            .collect();
        tasks.sort_by(|a, b| a.0.cmp(&b.0));
        tasks.into_iter().map(|(_, task)| task).collect()
    }

    fn lookup_profile(&self, task: TaskId) -> Option<Arc<ProfileRecord>> {
        self.get(task)
    }
}
