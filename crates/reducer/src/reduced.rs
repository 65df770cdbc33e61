// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Merged profiles produced on the coordinator

use std::collections::BTreeMap;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use taskprof_profile::{ProfileRecord, ProfileSnapshot};

/// Merged name → profile table, ordered by name
pub type ReducedTable = BTreeMap<String, ReducedProfile>;

/// One task's statistics summed across every participant
///
/// Derefs to [`ProfileSnapshot`] for the derived statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducedProfile {
    name: String,
    stats: ProfileSnapshot,
    participants: usize,
}

impl ReducedProfile {
    pub(crate) fn new(name: String, stats: ProfileSnapshot, participants: usize) -> Self {
        Self {
            name,
            stats,
            participants,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of participants that observed the task
    pub fn participants(&self) -> usize {
        self.participants
    }

    pub fn snapshot(&self) -> &ProfileSnapshot {
        &self.stats
    }

    /// Rebuild a record, e.g. to hand to a reporting registry
    pub fn into_record(self) -> ProfileRecord {
        ProfileRecord::from_snapshot(self.stats)
    }
}

impl Deref for ReducedProfile {
    type Target = ProfileSnapshot;

    fn deref(&self) -> &Self::Target {
        &self.stats
    }
}
