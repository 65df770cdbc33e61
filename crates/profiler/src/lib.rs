// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # taskprof
//!
//! Per-task runtime and counter profiling for multithreaded programs, with
//! a reduction that merges every participant's profiles at the end of a
//! distributed run.
//!
//! ## Overview
//!
//! - [`Profiler`]: identities, profiles and reduction for one run
//! - [`ScopedTimer`] / [`timed_scope!`]: drop-based timing
//! - [`ProfilerConfig`]: settings from code, JSON, YAML or the environment
//! - [`init_logging`]: `tracing` subscriber driven by `RUST_LOG`
//!
//! The building blocks live in `taskprof-identity`, `taskprof-profile` and
//! `taskprof-reducer` and are re-exported here.
//!
//! ## Usage
//!
//! ```rust
//! use taskprof::{Profiler, ProfilerConfig};
//!
//! let profiler = Profiler::new(ProfilerConfig::default()).unwrap();
//! let solve = profiler.task("solve");
//! profiler.sample_timer(solve, 1_500.0);
//! profiler.sample_timer(solve, 500.0);
//!
//! let output = tokio_test::block_on(profiler.reduce(None)).unwrap();
//! let table = output.table.unwrap();
//! assert_eq!(table["solve"].calls, 2);
//! assert_eq!(table["solve"].mean(), 1_000.0);
//! ```

pub mod config;
pub mod logging;
pub mod profiler;
pub mod timer;

// Re-exports
pub use config::{ConfigError, ProfilerConfig};
pub use logging::init_logging;
pub use profiler::{Profiler, current_thread_id};
pub use timer::ScopedTimer;

pub use taskprof_identity::{
    IdentityTables, NamingConfig, NullResolver, ResolutionError, RuleSpec, SymbolInfo,
    SymbolResolver, TaskGroup, TaskId,
};
pub use taskprof_profile::{
    AllocationDelta, ProfileKind, ProfileRecord, ProfileRegistry, ProfileSnapshot, ProfileTable,
    Sample,
};
pub use taskprof_reducer::{
    CommError, Communicator, LocalGroup, ProfileReducer, ReduceError, ReducedProfile,
    ReducedTable, ReducerConfig, ReductionOutput, SoloCommunicator,
};
