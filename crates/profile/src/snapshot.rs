// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Profile snapshots
//!
//! A [`ProfileSnapshot`] is a plain copy of every statistic of one record.
//! Fields hold the raw stored values; methods report them the way
//! downstream consumers should see them (sentinel minimum read as 0,
//! counters without an inclusive value, NaN for statistics of zero calls).

use serde::{Deserialize, Serialize};

use crate::sample::{HardwareCounters, MAX_HARDWARE_COUNTERS};

/// Nanoseconds to microseconds
pub const NANOS_TO_MICROS: f64 = 1.0e-3;
/// Nanoseconds to seconds
pub const NANOS_TO_SECONDS: f64 = 1.0e-9;

/// What a profile measures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileKind {
    /// Durations with call counts and inclusive/exclusive time
    #[default]
    Timer,
    /// A sampled scalar
    Counter,
}

impl ProfileKind {
    /// Numeric tag used in fixed-width exchange rows
    pub fn tag(self) -> f64 {
        match self {
            ProfileKind::Timer => 0.0,
            ProfileKind::Counter => 1.0,
        }
    }

    /// Inverse of [`ProfileKind::tag`]
    pub fn from_tag(tag: f64) -> Option<Self> {
        if tag == 0.0 {
            Some(ProfileKind::Timer)
        } else if tag == 1.0 {
            Some(ProfileKind::Counter)
        } else {
            None
        }
    }
}

/// Complete statistics of one profile at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub kind: ProfileKind,
    /// Completed calls (yielded samples excluded)
    pub calls: u64,
    /// Every sample, yielded or not
    pub stops: u64,
    /// Exclusive measure
    pub accumulated: f64,
    pub inclusive_accumulated: f64,
    pub sum_of_squares: f64,
    /// Raw minimum; `f64::MAX` right after a reset
    pub minimum: f64,
    pub maximum: f64,
    pub times_reset: u32,
    pub counters: HardwareCounters,
    pub allocations: u64,
    pub frees: u64,
    pub bytes_allocated: u64,
    pub bytes_freed: u64,
    pub num_threads: u64,
    pub throttled: bool,
}

impl ProfileSnapshot {
    /// All-zero statistics of the given kind
    pub fn empty(kind: ProfileKind) -> Self {
        Self {
            kind,
            calls: 0,
            stops: 0,
            accumulated: 0.0,
            inclusive_accumulated: 0.0,
            sum_of_squares: 0.0,
            minimum: 0.0,
            maximum: 0.0,
            times_reset: 0,
            counters: [0.0; MAX_HARDWARE_COUNTERS],
            allocations: 0,
            frees: 0,
            bytes_allocated: 0,
            bytes_freed: 0,
            num_threads: 0,
            throttled: false,
        }
    }

    /// `accumulated / calls`, or NaN when there are no calls
    pub fn mean(&self) -> f64 {
        self.checked_mean().unwrap_or(f64::NAN)
    }

    /// `accumulated / calls`, or `None` when there are no calls
    pub fn checked_mean(&self) -> Option<f64> {
        if self.calls == 0 {
            return None;
        }
        Some(self.accumulated / self.calls as f64)
    }

    /// Population variance, clamped at zero; NaN when there are no calls
    pub fn variance(&self) -> f64 {
        let Some(mean) = self.checked_mean() else {
            return f64::NAN;
        };
        let variance = self.sum_of_squares / self.calls as f64 - mean * mean;
        variance.max(0.0)
    }

    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum as reported: 0 while a reset record has no new sample,
    /// and never below 0
    pub fn minimum(&self) -> f64 {
        if self.times_reset > 0 && self.minimum == f64::MAX {
            return 0.0;
        }
        self.minimum.max(0.0)
    }

    /// Inclusive measure as reported: never below the exclusive measure for
    /// timers, always 0 for counters
    pub fn inclusive_accumulated(&self) -> f64 {
        match self.kind {
            ProfileKind::Timer => self.accumulated.max(self.inclusive_accumulated),
            ProfileKind::Counter => 0.0,
        }
    }

    pub fn accumulated_useconds(&self) -> f64 {
        self.accumulated * NANOS_TO_MICROS
    }

    pub fn accumulated_seconds(&self) -> f64 {
        self.accumulated * NANOS_TO_SECONDS
    }

    pub fn inclusive_accumulated_useconds(&self) -> f64 {
        self.inclusive_accumulated() * NANOS_TO_MICROS
    }

    pub fn inclusive_accumulated_seconds(&self) -> f64 {
        self.inclusive_accumulated() * NANOS_TO_SECONDS
    }

    pub fn mean_useconds(&self) -> f64 {
        self.mean() * NANOS_TO_MICROS
    }

    pub fn mean_seconds(&self) -> f64 {
        self.mean() * NANOS_TO_SECONDS
    }

    /// Accumulated measure averaged over the threads that contributed
    pub fn accumulated_mean_threads(&self) -> f64 {
        self.accumulated / self.num_threads as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(calls: u64, accumulated: f64, sum_of_squares: f64) -> ProfileSnapshot {
        ProfileSnapshot {
            calls,
            stops: calls,
            accumulated,
            sum_of_squares,
            num_threads: 1,
            ..ProfileSnapshot::empty(ProfileKind::Timer)
        }
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(ProfileKind::from_tag(ProfileKind::Timer.tag()), Some(ProfileKind::Timer));
        assert_eq!(
            ProfileKind::from_tag(ProfileKind::Counter.tag()),
            Some(ProfileKind::Counter)
        );
        assert_eq!(ProfileKind::from_tag(7.0), None);
    }

    #[test]
    fn test_mean_and_variance() {
        // values 2, 4, 6
        let snap = timer(3, 12.0, 56.0);
        assert_eq!(snap.mean(), 4.0);
        assert!((snap.variance() - 8.0 / 3.0).abs() < 1e-12);
        assert!((snap.stddev() - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_zero_calls_is_nan_not_panic() {
        let snap = timer(0, 0.0, 0.0);
        assert!(snap.mean().is_nan());
        assert!(snap.variance().is_nan());
        assert_eq!(snap.checked_mean(), None);
    }

    #[test]
    fn test_variance_clamped_against_cancellation() {
        // identical large values: sum_sq/n - mean^2 may round below zero
        let v = 1.0e8 + 0.1;
        let snap = timer(3, 3.0 * v, 3.0 * v * v * (1.0 - 1e-16));
        assert!(snap.variance() >= 0.0);
    }

    #[test]
    fn test_minimum_sentinel_reads_zero_after_reset() {
        let mut snap = timer(0, 0.0, 0.0);
        snap.minimum = f64::MAX;
        snap.times_reset = 1;
        assert_eq!(snap.minimum(), 0.0);
    }

    #[test]
    fn test_inclusive_by_kind() {
        let mut snap = timer(1, 10.0, 100.0);
        snap.inclusive_accumulated = 4.0;
        assert_eq!(snap.inclusive_accumulated(), 10.0);
        snap.inclusive_accumulated = 25.0;
        assert_eq!(snap.inclusive_accumulated(), 25.0);
        snap.kind = ProfileKind::Counter;
        assert_eq!(snap.inclusive_accumulated(), 0.0);
    }

    #[test]
    fn test_unit_conversions() {
        let snap = timer(2, 4_000_000.0, 0.0);
        assert_eq!(snap.accumulated_useconds(), 4_000.0);
        assert!((snap.accumulated_seconds() - 0.004).abs() < 1e-15);
        assert_eq!(snap.mean_useconds(), 2_000.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snap = timer(2, 4.0, 8.0);
        let json = serde_json::to_string(&snap).unwrap();
        let back: ProfileSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
