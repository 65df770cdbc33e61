// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Samples
//!
//! One observation handed to a profile record: the measured value, optional
//! hardware-counter deltas and optional allocation-tracking deltas.

use serde::{Deserialize, Serialize};

/// Number of hardware-counter accumulators per record
pub const MAX_HARDWARE_COUNTERS: usize = 8;

/// Fixed-size block of hardware-counter values
pub type HardwareCounters = [f64; MAX_HARDWARE_COUNTERS];

/// Allocation activity observed during one sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationDelta {
    pub allocations: u64,
    pub frees: u64,
    pub bytes_allocated: u64,
    pub bytes_freed: u64,
}

impl AllocationDelta {
    pub fn new(allocations: u64, frees: u64, bytes_allocated: u64, bytes_freed: u64) -> Self {
        Self {
            allocations,
            frees,
            bytes_allocated,
            bytes_freed,
        }
    }
}

/// One observed measurement
///
/// `value` is the exclusive measure in nanoseconds for timers, or the sampled
/// scalar for counters. A `yielded` sample marks a pause rather than a
/// completed call: it counts as a stop but not as a call.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub value: f64,
    pub inclusive: f64,
    pub counters: Option<HardwareCounters>,
    pub yielded: bool,
    pub allocation: Option<AllocationDelta>,
}

impl Sample {
    /// A sample whose inclusive value equals its exclusive value
    pub fn new(value: f64) -> Self {
        Self::timed(value, value)
    }

    /// A timer sample with separate exclusive and inclusive values
    pub fn timed(exclusive: f64, inclusive: f64) -> Self {
        Self {
            value: exclusive,
            inclusive,
            counters: None,
            yielded: false,
            allocation: None,
        }
    }

    /// Attach hardware-counter values; extra values beyond eight are ignored
    pub fn with_counters(mut self, values: &[f64]) -> Self {
        let mut counters = [0.0; MAX_HARDWARE_COUNTERS];
        for (slot, value) in counters.iter_mut().zip(values) {
            *slot = *value;
        }
        self.counters = Some(counters);
        self
    }

    /// Mark the sample as a pause instead of a completed call
    pub fn yielded(mut self) -> Self {
        self.yielded = true;
        self
    }

    pub fn with_allocations(mut self, delta: AllocationDelta) -> Self {
        self.allocation = Some(delta);
        self
    }
}
