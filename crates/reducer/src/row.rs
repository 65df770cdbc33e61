// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Fixed-width profile rows
//!
//! [`ProfileRow`] is the only shape in which statistics cross participant
//! boundaries. On the wire a row is [`ROW_WIDTH`] `f64` slots in this
//! order:
//!
//! | slot | field |
//! |------|-------|
//! | 0 | calls |
//! | 1 | stops |
//! | 2 | accumulated |
//! | 3 | sum_of_squares |
//! | 4 | minimum |
//! | 5 | maximum |
//! | 6 | times_reset |
//! | 7 | kind tag (0 = timer, 1 = counter) |
//! | 8 | allocations |
//! | 9 | frees |
//! | 10 | bytes_allocated |
//! | 11 | bytes_freed |
//! | 12..20 | hardware counters |
//! | 20 | inclusive_accumulated |
//! | 21 | num_threads |
//! | 22 | throttled (0 or 1) |
//!
//! A participant that never observed a task sends an all-zero row.

use serde::{Deserialize, Serialize};
use taskprof_profile::{HardwareCounters, MAX_HARDWARE_COUNTERS, ProfileKind, ProfileSnapshot};

use crate::error::{ReduceError, ReduceResult};

/// Number of scalar fields ahead of the hardware counters
const SCALAR_SLOTS: usize = 12;

/// First slot after the hardware counters
const TRAILER_SLOT: usize = SCALAR_SLOTS + MAX_HARDWARE_COUNTERS;

/// Slots per row
pub const ROW_WIDTH: usize = TRAILER_SLOT + 3;

/// One task's statistics in exchange layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub calls: f64,
    pub stops: f64,
    pub accumulated: f64,
    pub sum_of_squares: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub times_reset: f64,
    pub kind: ProfileKind,
    pub allocations: f64,
    pub frees: f64,
    pub bytes_allocated: f64,
    pub bytes_freed: f64,
    pub counters: HardwareCounters,
    pub inclusive_accumulated: f64,
    pub num_threads: f64,
    pub throttled: bool,
}

impl ProfileRow {
    /// Row sent for a task this participant never observed
    pub fn zero() -> Self {
        Self {
            calls: 0.0,
            stops: 0.0,
            accumulated: 0.0,
            sum_of_squares: 0.0,
            minimum: 0.0,
            maximum: 0.0,
            times_reset: 0.0,
            kind: ProfileKind::Timer,
            allocations: 0.0,
            frees: 0.0,
            bytes_allocated: 0.0,
            bytes_freed: 0.0,
            counters: [0.0; MAX_HARDWARE_COUNTERS],
            inclusive_accumulated: 0.0,
            num_threads: 0.0,
            throttled: false,
        }
    }

    /// Starting point for combination: zero sums, `f64::MAX` minimum, zero maximum
    pub fn identity() -> Self {
        Self {
            minimum: f64::MAX,
            ..Self::zero()
        }
    }

    /// Row for a local profile
    ///
    /// The minimum is sent raw, except that the reset sentinel of a record
    /// without new samples goes out as 0. Counter profiles carry no hardware
    /// counters.
    pub fn from_snapshot(snapshot: &ProfileSnapshot) -> Self {
        let counters = match snapshot.kind {
            ProfileKind::Timer => snapshot.counters,
            ProfileKind::Counter => [0.0; MAX_HARDWARE_COUNTERS],
        };
        Self {
            calls: snapshot.calls as f64,
            stops: snapshot.stops as f64,
            accumulated: snapshot.accumulated,
            sum_of_squares: snapshot.sum_of_squares,
            minimum: if snapshot.times_reset > 0 && snapshot.minimum == f64::MAX {
                0.0
            } else {
                snapshot.minimum
            },
            maximum: snapshot.maximum,
            times_reset: f64::from(snapshot.times_reset),
            kind: snapshot.kind,
            allocations: snapshot.allocations as f64,
            frees: snapshot.frees as f64,
            bytes_allocated: snapshot.bytes_allocated as f64,
            bytes_freed: snapshot.bytes_freed as f64,
            counters,
            inclusive_accumulated: snapshot.inclusive_accumulated,
            num_threads: snapshot.num_threads as f64,
            throttled: snapshot.throttled,
        }
    }

    /// Whether the row carries at least one sample
    ///
    /// Rows without samples only take part in the sums.
    pub fn is_observed(&self) -> bool {
        self.calls != 0.0 || self.stops != 0.0
    }

    /// Whether the row is the all-zero filler for a task the sender never saw
    pub fn is_placeholder(&self) -> bool {
        *self == Self::zero()
    }

    pub fn to_slots(&self) -> [f64; ROW_WIDTH] {
        let mut slots = [0.0; ROW_WIDTH];
        slots[0] = self.calls;
        slots[1] = self.stops;
        slots[2] = self.accumulated;
        slots[3] = self.sum_of_squares;
        slots[4] = self.minimum;
        slots[5] = self.maximum;
        slots[6] = self.times_reset;
        slots[7] = self.kind.tag();
        slots[8] = self.allocations;
        slots[9] = self.frees;
        slots[10] = self.bytes_allocated;
        slots[11] = self.bytes_freed;
        slots[SCALAR_SLOTS..TRAILER_SLOT].copy_from_slice(&self.counters);
        slots[TRAILER_SLOT] = self.inclusive_accumulated;
        slots[TRAILER_SLOT + 1] = self.num_threads;
        slots[TRAILER_SLOT + 2] = if self.throttled { 1.0 } else { 0.0 };
        slots
    }

    /// Parse one row from exactly [`ROW_WIDTH`] slots
    ///
    /// # Errors
    ///
    /// Returns `ReduceError::RowWidth` for a slice of the wrong length and
    /// `ReduceError::MalformedExchange` for an unknown kind tag.
    pub fn from_slots(slots: &[f64]) -> ReduceResult<Self> {
        if slots.len() != ROW_WIDTH {
            return Err(ReduceError::RowWidth {
                expected: ROW_WIDTH,
                actual: slots.len(),
            });
        }
        let kind = ProfileKind::from_tag(slots[7]).ok_or_else(|| {
            ReduceError::MalformedExchange(format!("unknown profile kind tag {}", slots[7]))
        })?;
        let mut counters = [0.0; MAX_HARDWARE_COUNTERS];
        counters.copy_from_slice(&slots[SCALAR_SLOTS..TRAILER_SLOT]);

        Ok(Self {
            calls: slots[0],
            stops: slots[1],
            accumulated: slots[2],
            sum_of_squares: slots[3],
            minimum: slots[4],
            maximum: slots[5],
            times_reset: slots[6],
            kind,
            allocations: slots[8],
            frees: slots[9],
            bytes_allocated: slots[10],
            bytes_freed: slots[11],
            counters,
            inclusive_accumulated: slots[TRAILER_SLOT],
            num_threads: slots[TRAILER_SLOT + 1],
            throttled: slots[TRAILER_SLOT + 2] != 0.0,
        })
    }

    /// Fold `other` into `self`
    ///
    /// Sums for counts, totals, counters and thread counts; running min and
    /// max for the extremes. Unobserved rows leave the extremes alone and
    /// placeholder rows leave the kind alone. `throttled` is sticky.
    pub fn combine(&mut self, other: &ProfileRow) {
        let self_observed = self.is_observed();
        self.calls += other.calls;
        self.stops += other.stops;
        self.accumulated += other.accumulated;
        self.sum_of_squares += other.sum_of_squares;
        self.times_reset += other.times_reset;
        self.allocations += other.allocations;
        self.frees += other.frees;
        self.bytes_allocated += other.bytes_allocated;
        self.bytes_freed += other.bytes_freed;
        self.inclusive_accumulated += other.inclusive_accumulated;
        self.num_threads += other.num_threads;
        self.throttled |= other.throttled;
        for (acc, value) in self.counters.iter_mut().zip(&other.counters) {
            *acc += *value;
        }

        if other.is_observed() {
            if self_observed {
                self.minimum = self.minimum.min(other.minimum);
                self.maximum = self.maximum.max(other.maximum);
            } else {
                self.minimum = other.minimum;
                self.maximum = other.maximum;
            }
        }
        if !other.is_placeholder() {
            self.kind = other.kind;
        }
    }

    /// Statistics of a combined row
    ///
    /// A row nobody observed reports a zero minimum.
    pub fn into_snapshot(self) -> ProfileSnapshot {
        let minimum = if self.minimum == f64::MAX { 0.0 } else { self.minimum };
        ProfileSnapshot {
            kind: self.kind,
            calls: self.calls as u64,
            stops: self.stops as u64,
            accumulated: self.accumulated,
            inclusive_accumulated: self.inclusive_accumulated,
            sum_of_squares: self.sum_of_squares,
            minimum,
            maximum: self.maximum,
            times_reset: self.times_reset as u32,
            counters: self.counters,
            allocations: self.allocations as u64,
            frees: self.frees as u64,
            bytes_allocated: self.bytes_allocated as u64,
            bytes_freed: self.bytes_freed as u64,
            num_threads: self.num_threads as u64,
            throttled: self.throttled,
        }
    }
}

impl Default for ProfileRow {
    fn default() -> Self {
        Self::zero()
    }
}

/// Combine any number of rows starting from [`ProfileRow::identity`]
pub fn merge_rows<'a, I>(rows: I) -> ProfileRow
where
    I: IntoIterator<Item = &'a ProfileRow>,
{
    rows.into_iter().fold(ProfileRow::identity(), |mut acc, row| {
        acc.combine(row);
        acc
    })
}
