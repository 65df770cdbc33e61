// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # taskprof - Profile Reduction
//!
//! Merges same-named task profiles from every participant of a run into one
//! table on a coordinating participant.
//!
//! ## Overview
//!
//! - [`Communicator`]: collective operations (`all_reduce_max`,
//!   `all_gather`, `gather_to_coordinator`, `barrier`)
//! - [`SoloCommunicator`] / [`LocalGroup`]: single-participant and
//!   in-process group implementations
//! - [`ProfileRow`]: fixed-width exchange layout of one profile
//! - [`ProfileReducer`]: the two-phase reduction pass
//! - [`ReducedProfile`]: merged statistics of one task
//!
//! ## Usage
//!
//! ```rust
//! use taskprof_identity::IdentityTables;
//! use taskprof_profile::{ProfileKind, ProfileTable, Sample};
//! use taskprof_reducer::{ProfileReducer, ReducerConfig};
//!
//! let ids = IdentityTables::with_defaults();
//! let table = ProfileTable::new();
//! table.record(ids.get_or_create_name("solve"), ProfileKind::Timer, &Sample::new(4.0), 0);
//!
//! let reducer = ProfileReducer::solo(ReducerConfig::default());
//! let output = tokio_test::block_on(reducer.reduce(&table)).unwrap();
//! let reduced = output.table.unwrap();
//! assert_eq!(reduced["solve"].calls, 1);
//! ```

pub mod communicator;
pub mod config;
pub mod error;
pub mod names;
pub mod reduced;
pub mod reducer;
pub mod row;

// Re-exports
pub use communicator::{Communicator, LocalGroup, LocalParticipant, SoloCommunicator};
pub use config::{DEFAULT_ROOT_TASK_NAME, ReducerConfig};
pub use error::{CommError, CommResult, ReduceError, ReduceResult};
pub use reduced::{ReducedProfile, ReducedTable};
pub use reducer::{ProfileReducer, ReductionOutput};
pub use row::{ProfileRow, ROW_WIDTH, merge_rows};
