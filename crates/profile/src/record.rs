// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Profile records
//!
//! A [`ProfileRecord`] accumulates the statistics of one task. Every mutation
//! and every read happens under the record's own mutex, so readers always
//! see the result of whole increments, and records of different tasks never
//! contend with each other.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::sample::{HardwareCounters, MAX_HARDWARE_COUNTERS, Sample};
use crate::snapshot::{ProfileKind, ProfileSnapshot};

struct RecordState {
    stats: ProfileSnapshot,
    threads: HashSet<u64>,
    /// Thread count inherited from a snapshot whose thread ids are unknown
    thread_floor: u64,
}

/// Thread-safe statistics accumulator for one task
pub struct ProfileRecord {
    state: Mutex<RecordState>,
    /// One-way latch owned by an external throttling policy
    throttled: AtomicBool,
}

impl ProfileRecord {
    /// Create a record from its first sample
    ///
    /// The creating thread is not recorded; `num_threads` starts at 1.
    pub fn new(kind: ProfileKind, sample: &Sample) -> Self {
        let mut stats = ProfileSnapshot::empty(kind);
        stats.calls = if sample.yielded { 0 } else { 1 };
        stats.stops = 1;
        stats.accumulated = sample.value;
        stats.inclusive_accumulated = sample.inclusive;
        stats.sum_of_squares = sample.value * sample.value;
        stats.minimum = sample.value;
        stats.maximum = sample.value;
        stats.num_threads = 1;
        if let Some(counters) = &sample.counters {
            stats.counters = *counters;
        }
        if let Some(delta) = &sample.allocation {
            stats.allocations = delta.allocations;
            stats.frees = delta.frees;
            stats.bytes_allocated = delta.bytes_allocated;
            stats.bytes_freed = delta.bytes_freed;
        }

        Self {
            state: Mutex::new(RecordState {
                stats,
                threads: HashSet::new(),
                thread_floor: 0,
            }),
            throttled: AtomicBool::new(false),
        }
    }

    /// Create a record from its first sample, observed on `thread_id`
    pub fn new_on_thread(kind: ProfileKind, sample: &Sample, thread_id: u64) -> Self {
        let record = Self::new(kind, sample);
        record.state.lock().threads.insert(thread_id);
        record
    }

    /// Rebuild a record from a snapshot, e.g. a merged result
    ///
    /// The snapshot's thread count is kept as a lower bound for later
    /// increments.
    pub fn from_snapshot(snapshot: ProfileSnapshot) -> Self {
        let throttled = snapshot.throttled;
        let thread_floor = snapshot.num_threads;
        Self {
            state: Mutex::new(RecordState {
                stats: snapshot,
                threads: HashSet::new(),
                thread_floor,
            }),
            throttled: AtomicBool::new(throttled),
        }
    }

    /// Fold one sample into the statistics as a single critical section
    pub fn increment(&self, sample: &Sample, thread_id: u64) {
        let mut state = self.state.lock();
        let stats = &mut state.stats;

        stats.accumulated += sample.value;
        stats.inclusive_accumulated += sample.inclusive;
        stats.stops += 1;
        if let Some(counters) = &sample.counters {
            for (acc, value) in stats.counters.iter_mut().zip(counters) {
                *acc += *value;
            }
        }
        stats.sum_of_squares += sample.value * sample.value;
        stats.minimum = stats.minimum.min(sample.value);
        stats.maximum = stats.maximum.max(sample.value);
        if !sample.yielded {
            stats.calls += 1;
        }
        if let Some(delta) = &sample.allocation {
            stats.allocations += delta.allocations;
            stats.frees += delta.frees;
            stats.bytes_allocated += delta.bytes_allocated;
            stats.bytes_freed += delta.bytes_freed;
        }

        state.threads.insert(thread_id);
        state.stats.num_threads = (state.threads.len() as u64).max(state.thread_floor);
    }

    /// Start a new measurement window
    ///
    /// The minimum becomes `f64::MAX` until the next sample; `minimum()`
    /// reports 0 in that state.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let stats = &mut state.stats;

        stats.calls = 0;
        stats.stops = 0;
        stats.accumulated = 0.0;
        stats.inclusive_accumulated = 0.0;
        stats.sum_of_squares = 0.0;
        stats.minimum = f64::MAX;
        stats.maximum = 0.0;
        stats.counters = [0.0; MAX_HARDWARE_COUNTERS];
        stats.allocations = 0;
        stats.frees = 0;
        stats.bytes_allocated = 0;
        stats.bytes_freed = 0;
        stats.times_reset += 1;
        stats.num_threads = 1;
        state.threads.clear();
        state.thread_floor = 0;
    }

    /// Consistent copy of every statistic
    pub fn snapshot(&self) -> ProfileSnapshot {
        let mut stats = self.state.lock().stats.clone();
        stats.throttled = self.is_throttled();
        stats
    }

    fn read<R>(&self, f: impl FnOnce(&ProfileSnapshot) -> R) -> R {
        f(&self.state.lock().stats)
    }

    pub fn kind(&self) -> ProfileKind {
        self.read(|s| s.kind)
    }

    pub fn calls(&self) -> u64 {
        self.read(|s| s.calls)
    }

    pub fn stops(&self) -> u64 {
        self.read(|s| s.stops)
    }

    pub fn accumulated(&self) -> f64 {
        self.read(|s| s.accumulated)
    }

    /// See [`ProfileSnapshot::inclusive_accumulated`]
    pub fn inclusive_accumulated(&self) -> f64 {
        self.read(|s| s.inclusive_accumulated())
    }

    pub fn sum_of_squares(&self) -> f64 {
        self.read(|s| s.sum_of_squares)
    }

    /// See [`ProfileSnapshot::minimum`]
    pub fn minimum(&self) -> f64 {
        self.read(|s| s.minimum())
    }

    pub fn maximum(&self) -> f64 {
        self.read(|s| s.maximum)
    }

    pub fn times_reset(&self) -> u32 {
        self.read(|s| s.times_reset)
    }

    pub fn counters(&self) -> HardwareCounters {
        self.read(|s| s.counters)
    }

    pub fn allocations(&self) -> u64 {
        self.read(|s| s.allocations)
    }

    pub fn frees(&self) -> u64 {
        self.read(|s| s.frees)
    }

    pub fn bytes_allocated(&self) -> u64 {
        self.read(|s| s.bytes_allocated)
    }

    pub fn bytes_freed(&self) -> u64 {
        self.read(|s| s.bytes_freed)
    }

    pub fn num_threads(&self) -> u64 {
        self.read(|s| s.num_threads)
    }

    /// NaN when `calls() == 0`; check first or use [`Self::checked_mean`]
    pub fn mean(&self) -> f64 {
        self.read(|s| s.mean())
    }

    pub fn checked_mean(&self) -> Option<f64> {
        self.read(|s| s.checked_mean())
    }

    pub fn variance(&self) -> f64 {
        self.read(|s| s.variance())
    }

    pub fn stddev(&self) -> f64 {
        self.read(|s| s.stddev())
    }

    pub fn mean_useconds(&self) -> f64 {
        self.read(|s| s.mean_useconds())
    }

    pub fn mean_seconds(&self) -> f64 {
        self.read(|s| s.mean_seconds())
    }

    pub fn accumulated_useconds(&self) -> f64 {
        self.read(|s| s.accumulated_useconds())
    }

    pub fn accumulated_seconds(&self) -> f64 {
        self.read(|s| s.accumulated_seconds())
    }

    pub fn inclusive_accumulated_useconds(&self) -> f64 {
        self.read(|s| s.inclusive_accumulated_useconds())
    }

    pub fn inclusive_accumulated_seconds(&self) -> f64 {
        self.read(|s| s.inclusive_accumulated_seconds())
    }

    pub fn accumulated_mean_threads(&self) -> f64 {
        self.read(|s| s.accumulated_mean_threads())
    }

    pub fn is_throttled(&self) -> bool {
        self.throttled.load(Ordering::Acquire)
    }

    /// Latch the throttled flag; it is never cleared
    pub fn set_throttled(&self) {
        self.throttled.store(true, Ordering::Release);
    }
}

impl std::fmt::Debug for ProfileRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileRecord")
            .field("stats", &self.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::AllocationDelta;

    #[test]
    fn test_new_from_sample() {
        let record = ProfileRecord::new(ProfileKind::Timer, &Sample::timed(5.0, 8.0));
        assert_eq!(record.calls(), 1);
        assert_eq!(record.stops(), 1);
        assert_eq!(record.accumulated(), 5.0);
        assert_eq!(record.inclusive_accumulated(), 8.0);
        assert_eq!(record.sum_of_squares(), 25.0);
        assert_eq!(record.minimum(), 5.0);
        assert_eq!(record.maximum(), 5.0);
        assert_eq!(record.num_threads(), 1);
        assert_eq!(record.times_reset(), 0);
    }

    #[test]
    fn test_yielded_counts_stop_not_call() {
        let record = ProfileRecord::new(ProfileKind::Timer, &Sample::new(3.0).yielded());
        assert_eq!(record.calls(), 0);
        assert_eq!(record.stops(), 1);

        record.increment(&Sample::new(2.0).yielded(), 1);
        record.increment(&Sample::new(4.0), 1);
        assert_eq!(record.calls(), 1);
        assert_eq!(record.stops(), 3);
        assert_eq!(record.accumulated(), 9.0);
    }

    #[test]
    fn test_increment_updates_extremes_and_squares() {
        let record = ProfileRecord::new(ProfileKind::Timer, &Sample::new(5.0));
        record.increment(&Sample::new(2.0), 1);
        record.increment(&Sample::new(9.0), 1);
        assert_eq!(record.minimum(), 2.0);
        assert_eq!(record.maximum(), 9.0);
        assert_eq!(record.sum_of_squares(), 25.0 + 4.0 + 81.0);
        assert_eq!(record.mean(), 16.0 / 3.0);
    }

    #[test]
    fn test_increment_tracks_distinct_threads() {
        let record = ProfileRecord::new_on_thread(ProfileKind::Timer, &Sample::new(1.0), 1);
        record.increment(&Sample::new(1.0), 1);
        record.increment(&Sample::new(1.0), 2);
        record.increment(&Sample::new(1.0), 3);
        assert_eq!(record.num_threads(), 3);
        assert_eq!(record.accumulated_mean_threads(), 4.0 / 3.0);
    }

    #[test]
    fn test_snapshot_thread_count_is_a_floor() {
        let mut snapshot = ProfileSnapshot::empty(ProfileKind::Timer);
        snapshot.calls = 4;
        snapshot.stops = 4;
        snapshot.num_threads = 4;
        let record = ProfileRecord::from_snapshot(snapshot);

        record.increment(&Sample::new(1.0), 9);
        assert_eq!(record.num_threads(), 4);
        for thread in 10..14 {
            record.increment(&Sample::new(1.0), thread);
        }
        assert_eq!(record.num_threads(), 5);

        record.reset();
        record.increment(&Sample::new(1.0), 9);
        assert_eq!(record.num_threads(), 1);
    }

    #[test]
    fn test_counters_and_allocations_accumulate() {
        let record = ProfileRecord::new(
            ProfileKind::Timer,
            &Sample::new(1.0)
                .with_counters(&[10.0, 1.0])
                .with_allocations(AllocationDelta::new(2, 1, 64, 32)),
        );
        record.increment(
            &Sample::new(1.0)
                .with_counters(&[5.0, 1.0])
                .with_allocations(AllocationDelta::new(1, 1, 16, 16)),
            0,
        );
        assert_eq!(record.counters()[..3], [15.0, 2.0, 0.0]);
        assert_eq!(record.allocations(), 3);
        assert_eq!(record.frees(), 2);
        assert_eq!(record.bytes_allocated(), 80);
        assert_eq!(record.bytes_freed(), 48);
    }

    #[test]
    fn test_reset_sentinel_minimum() {
        let record = ProfileRecord::new(ProfileKind::Timer, &Sample::new(5.0));
        record.reset();
        assert_eq!(record.calls(), 0);
        assert_eq!(record.stops(), 0);
        assert_eq!(record.accumulated(), 0.0);
        assert_eq!(record.maximum(), 0.0);
        assert_eq!(record.times_reset(), 1);
        assert_eq!(record.snapshot().minimum, f64::MAX);
        assert_eq!(record.minimum(), 0.0);

        record.increment(&Sample::new(7.0), 0);
        assert_eq!(record.minimum(), 7.0);
    }

    #[test]
    fn test_counter_has_no_inclusive() {
        let record = ProfileRecord::new(ProfileKind::Counter, &Sample::timed(3.0, 10.0));
        assert_eq!(record.inclusive_accumulated(), 0.0);
        assert_eq!(record.kind(), ProfileKind::Counter);
    }

    #[test]
    fn test_throttled_latch() {
        let record = ProfileRecord::new(ProfileKind::Timer, &Sample::new(1.0));
        assert!(!record.is_throttled());
        record.set_throttled();
        record.reset();
        assert!(record.is_throttled());
        assert!(record.snapshot().throttled);
    }

    #[test]
    fn test_from_snapshot_roundtrip() {
        let record = ProfileRecord::new(ProfileKind::Timer, &Sample::new(4.0));
        record.increment(&Sample::new(6.0), 2);
        let copy = ProfileRecord::from_snapshot(record.snapshot());
        assert_eq!(copy.snapshot(), record.snapshot());
    }

    #[test]
    fn test_zero_calls_mean_is_nan() {
        let record = ProfileRecord::new(ProfileKind::Timer, &Sample::new(4.0).yielded());
        assert!(record.mean().is_nan());
        assert_eq!(record.checked_mean(), None);
    }
}
