// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # taskprof - Profile Statistics
//!
//! Concurrent accumulation of per-task runtime and counter statistics.
//!
//! ## Overview
//!
//! - [`ProfileRecord`]: per-task accumulator, one mutex per record
//! - [`Sample`]: one observation (value, counters, allocation deltas)
//! - [`ProfileSnapshot`]: consistent copy with derived statistics
//! - [`ProfileRegistry`] / [`ProfileTable`]: identity → record mapping
//!
//! ## Usage
//!
//! ```rust
//! use taskprof_identity::IdentityTables;
//! use taskprof_profile::{ProfileKind, ProfileRegistry, ProfileTable, Sample};
//!
//! let ids = IdentityTables::with_defaults();
//! let table = ProfileTable::new();
//! let task = ids.get_or_create_name("solve");
//!
//! table.record(task, ProfileKind::Timer, &Sample::new(120.0), 0);
//! table.record(task, ProfileKind::Timer, &Sample::new(80.0), 1);
//!
//! let profile = table.lookup_profile(task).unwrap();
//! assert_eq!(profile.calls(), 2);
//! assert_eq!(profile.mean(), 100.0);
//! ```

pub mod record;
pub mod registry;
pub mod sample;
pub mod snapshot;

// Re-exports
pub use record::ProfileRecord;
pub use registry::{ProfileRegistry, ProfileTable};
pub use sample::{AllocationDelta, HardwareCounters, MAX_HARDWARE_COUNTERS, Sample};
pub use snapshot::{NANOS_TO_MICROS, NANOS_TO_SECONDS, ProfileKind, ProfileSnapshot};
