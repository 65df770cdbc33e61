// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Profiler
//!
//! [`Profiler`] ties the pieces together: it interns task identities,
//! routes samples to per-task records, and runs the reduction at the end of
//! a run. Most programs use the process-wide instance from
//! [`Profiler::global`]; tests build their own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use taskprof_identity::{IdentityTables, NullResolver, SymbolResolver, TaskId};
use taskprof_profile::{ProfileKind, ProfileRecord, ProfileTable, Sample};
use taskprof_reducer::{Communicator, ProfileReducer, ReduceResult, ReductionOutput};
use tracing::debug;

use crate::config::{ConfigError, ProfilerConfig};
use crate::timer::ScopedTimer;

static GLOBAL_PROFILER: OnceLock<Profiler> = OnceLock::new();

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Small dense id of the calling thread, assigned on first use
pub fn current_thread_id() -> u64 {
    THREAD_ID.with(|id| *id)
}

/// Identity tables, profile table and reduction settings of one run
#[derive(Debug)]
pub struct Profiler {
    config: ProfilerConfig,
    identities: IdentityTables,
    profiles: ProfileTable,
}

impl Profiler {
    /// Create a profiler without a symbol backend
    pub fn new(config: ProfilerConfig) -> Result<Self, ConfigError> {
        Self::with_resolver(config, Arc::new(NullResolver))
    }

    /// Create a profiler that names address tasks through `resolver`
    pub fn with_resolver(
        config: ProfilerConfig,
        resolver: Arc<dyn SymbolResolver>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let identities = IdentityTables::new(config.naming.clone(), resolver)?;
        Ok(Self {
            config,
            identities,
            profiles: ProfileTable::new(),
        })
    }

    /// Install the process-wide profiler
    ///
    /// Returns the profiler back if one is already installed.
    pub fn install_global(profiler: Profiler) -> Result<&'static Profiler, Profiler> {
        GLOBAL_PROFILER.set(profiler)?;
        Ok(Self::global())
    }

    /// The process-wide profiler, created with defaults on first use
    pub fn global() -> &'static Profiler {
        GLOBAL_PROFILER.get_or_init(Profiler::default)
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    pub fn identities(&self) -> &IdentityTables {
        &self.identities
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    /// Identity of a named task
    pub fn task(&self, name: &str) -> TaskId {
        self.identities.get_or_create_name(name)
    }

    /// Identity of the task at a code address
    pub fn task_at(&self, address: usize) -> TaskId {
        self.identities.get_or_create_address(address)
    }

    /// Record one sample for `task` on the calling thread
    pub fn sample(&self, task: TaskId, kind: ProfileKind, sample: &Sample) -> Arc<ProfileRecord> {
        self.profiles.record(task, kind, sample, current_thread_id())
    }

    /// Record a completed call lasting `nanos`
    pub fn sample_timer(&self, task: TaskId, nanos: f64) -> Arc<ProfileRecord> {
        self.sample(task, ProfileKind::Timer, &Sample::timed(nanos, nanos))
    }

    /// Record one value of a counter
    pub fn sample_counter(&self, task: TaskId, value: f64) -> Arc<ProfileRecord> {
        self.sample(task, ProfileKind::Counter, &Sample::new(value))
    }

    /// Start timing the named task; the sample is recorded on drop
    pub fn start_timer(&self, name: &str) -> ScopedTimer<'_> {
        ScopedTimer::new(self, self.task(name))
    }

    /// Start timing an existing task
    pub fn start_task_timer(&self, task: TaskId) -> ScopedTimer<'_> {
        ScopedTimer::new(self, task)
    }

    pub fn profile(&self, task: TaskId) -> Option<Arc<ProfileRecord>> {
        self.profiles.get(task)
    }

    /// Reset one task's statistics; false if it has none
    pub fn reset(&self, task: TaskId) -> bool {
        self.profiles.reset(task)
    }

    pub fn reset_all(&self) {
        self.profiles.reset_all();
    }

    /// Reduce this profiler's table across the group behind `communicator`
    ///
    /// Without a communicator the run is treated as single-participant.
    pub async fn reduce(
        &self,
        communicator: Option<Arc<dyn Communicator>>,
    ) -> ReduceResult<ReductionOutput> {
        let reducer = match communicator {
            Some(communicator) => ProfileReducer::new(self.config.reducer.clone(), communicator),
            None => ProfileReducer::solo(self.config.reducer.clone()),
        };
        debug!("Reducing {} local profiles", self.profiles.len());
        reducer.reduce(&self.profiles).await
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self {
            config: ProfilerConfig::default(),
            identities: IdentityTables::with_defaults(),
            profiles: ProfileTable::new(),
        }
    }
}
