// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Snapshot fixtures

use taskprof_profile::{ProfileKind, ProfileSnapshot};

/// Ready-made statistics for tests
pub struct ProfileFixtures;

impl ProfileFixtures {
    /// A timer with `calls` equal samples summing to `accumulated`
    pub fn timer(calls: u64, accumulated: f64) -> ProfileSnapshot {
        let per_call = if calls == 0 { 0.0 } else { accumulated / calls as f64 };
        ProfileSnapshot {
            calls,
            stops: calls,
            accumulated,
            inclusive_accumulated: accumulated,
            sum_of_squares: per_call * per_call * calls as f64,
            minimum: per_call,
            maximum: per_call,
            num_threads: 1,
            ..ProfileSnapshot::empty(ProfileKind::Timer)
        }
    }

    /// A timer with explicit extremes
    pub fn timer_with_range(calls: u64, accumulated: f64, minimum: f64, maximum: f64) -> ProfileSnapshot {
        ProfileSnapshot {
            minimum,
            maximum,
            ..Self::timer(calls, accumulated)
        }
    }

    /// A counter with `samples` samples summing to `total`
    pub fn counter(samples: u64, total: f64) -> ProfileSnapshot {
        ProfileSnapshot {
            kind: ProfileKind::Counter,
            inclusive_accumulated: 0.0,
            ..Self::timer(samples, total)
        }
    }
}
