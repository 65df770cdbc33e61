// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Profile reducer
//!
//! Merges every participant's profiles into one table on the coordinator.
//! A pass runs two phases, each built from collectives that every
//! participant executes in the same order, even with an empty registry:
//!
//! 1. **Name unification**: `all_reduce_max` agrees on the slot count and
//!    stride of the name buffer, `all_gather` exchanges the buffers, and
//!    every participant decodes the same sorted name set.
//! 2. **Numeric reduction**: each participant sends one [`ProfileRow`] per
//!    unified name with `gather_to_coordinator`; the coordinator combines
//!    the rows per name. A final `barrier` ends the pass.
//!
//! A failed collective leaves no participant with a consistent view, so it
//! is fatal: the reducer logs it and calls [`Communicator::abort`] unless
//! [`ReducerConfig::abort_on_failure`] is cleared.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use taskprof_profile::ProfileRegistry;
use tracing::{debug, error, info};

use crate::communicator::{Communicator, SoloCommunicator};
use crate::config::ReducerConfig;
use crate::error::{ReduceError, ReduceResult};
use crate::names::{decode_names_into, encode_names};
use crate::reduced::{ReducedProfile, ReducedTable};
use crate::row::{ProfileRow, ROW_WIDTH};

/// Result of one reduction pass
#[derive(Debug, Clone, Default)]
pub struct ReductionOutput {
    /// Every task name seen by any participant, sorted
    pub unified_names: BTreeSet<String>,
    /// Merged table; only present on the coordinator
    pub table: Option<ReducedTable>,
}

/// Cross-participant profile reducer
#[derive(Debug, Clone)]
pub struct ProfileReducer {
    config: ReducerConfig,
    communicator: Arc<dyn Communicator>,
}

impl ProfileReducer {
    pub fn new(config: ReducerConfig, communicator: Arc<dyn Communicator>) -> Self {
        Self {
            config,
            communicator,
        }
    }

    /// Reducer for a single-participant run
    pub fn solo(config: ReducerConfig) -> Self {
        Self::new(config, Arc::new(SoloCommunicator))
    }

    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    pub fn communicator(&self) -> &Arc<dyn Communicator> {
        &self.communicator
    }

    /// Run one reduction pass over `registry`
    ///
    /// # Errors
    ///
    /// Returns `ReduceError` for a failed collective or malformed exchange,
    /// but only when `abort_on_failure` is cleared; otherwise such failures
    /// abort through the communicator.
    pub async fn reduce(&self, registry: &dyn ProfileRegistry) -> ReduceResult<ReductionOutput> {
        match self.run(registry).await {
            Ok(output) => Ok(output),
            Err(e) => {
                error!(
                    "Profile reduction failed on participant {}: {}",
                    self.communicator.participant_id(),
                    e
                );
                if self.config.abort_on_failure {
                    self.communicator.abort(&e.to_string());
                }
                Err(e)
            }
        }
    }

    async fn run(&self, registry: &dyn ProfileRegistry) -> ReduceResult<ReductionOutput> {
        info!(
            "Reducing profiles on participant {} of {}",
            self.communicator.participant_id(),
            self.communicator.participant_count()
        );

        let local = self.collect_local(registry);
        let unified_names = self.unify_names(&local).await?;
        let table = self.reduce_rows(&unified_names, &local).await?;

        self.communicator
            .barrier()
            .await
            .map_err(ReduceError::collective("barrier"))?;

        if let Some(table) = &table {
            info!("Reduced {} profiles", table.len());
        }
        Ok(ReductionOutput {
            unified_names,
            table,
        })
    }

    /// Local rows keyed by resolved name
    ///
    /// Distinct tasks that resolve to the same name are combined here, so
    /// each name contributes one row. Trailing NULs are dropped from names
    /// since the name buffer cannot carry them.
    fn collect_local(&self, registry: &dyn ProfileRegistry) -> BTreeMap<String, ProfileRow> {
        let mut local: BTreeMap<String, ProfileRow> = BTreeMap::new();
        for task in registry.enumerate_known_tasks() {
            let mut name = task.get_name(true);
            name.truncate(name.trim_end_matches('\0').len());
            if self.config.is_root_task(&name) {
                continue;
            }
            let Some(profile) = registry.lookup_profile(task) else {
                continue;
            };
            let row = ProfileRow::from_snapshot(&profile.snapshot());
            local
                .entry(name)
                .and_modify(|merged| merged.combine(&row))
                .or_insert(row);
        }
        local
    }

    async fn unify_names(&self, local: &BTreeMap<String, ProfileRow>) -> ReduceResult<BTreeSet<String>> {
        let count = local.len() as u64;
        let max_len = local.keys().map(|name| name.len()).max().unwrap_or(0) as u64 + 1;

        let global = self
            .communicator
            .all_reduce_max(&[count, max_len])
            .await
            .map_err(ReduceError::collective("all_reduce_max"))?;
        let [slots, stride] = global[..] else {
            return Err(ReduceError::MalformedExchange(format!(
                "all_reduce_max returned {} values, expected 2",
                global.len()
            )));
        };
        let (slots, stride) = (slots as usize, stride as usize);

        let buffer = encode_names(local.keys().map(String::as_str), slots, stride)?;
        let gathered = self
            .communicator
            .all_gather(&buffer)
            .await
            .map_err(ReduceError::collective("all_gather"))?;

        // The gathered buffer holds this participant's names too; deriving
        // the set from it alone keeps every participant's set identical.
        let mut names = BTreeSet::new();
        decode_names_into(&gathered, stride, &mut names)?;
        debug!(
            "Unified {} task names ({} local, stride {})",
            names.len(),
            local.len(),
            stride
        );
        Ok(names)
    }

    async fn reduce_rows(
        &self,
        names: &BTreeSet<String>,
        local: &BTreeMap<String, ProfileRow>,
    ) -> ReduceResult<Option<ReducedTable>> {
        let mut outgoing = Vec::with_capacity(names.len() * ROW_WIDTH);
        for name in names {
            let row = local.get(name).copied().unwrap_or_else(ProfileRow::zero);
            outgoing.extend_from_slice(&row.to_slots());
        }

        let gathered = self
            .communicator
            .gather_to_coordinator(&outgoing)
            .await
            .map_err(ReduceError::collective("gather_to_coordinator"))?;
        let Some(gathered) = gathered else {
            return Ok(None);
        };

        let per_participant = names.len() * ROW_WIDTH;
        if per_participant == 0 {
            return Ok(Some(ReducedTable::new()));
        }
        if gathered.len() % per_participant != 0 {
            return Err(ReduceError::MalformedExchange(format!(
                "gathered {} slots, not a multiple of {} names",
                gathered.len(),
                names.len()
            )));
        }
        debug!(
            "Combining {} rows from {} participants",
            names.len(),
            gathered.len() / per_participant
        );

        let mut merged = vec![(ProfileRow::identity(), 0usize); names.len()];
        for block in gathered.chunks(per_participant) {
            for (slots, (acc, observers)) in block.chunks(ROW_WIDTH).zip(merged.iter_mut()) {
                let row = ProfileRow::from_slots(slots)?;
                if row.is_observed() {
                    *observers += 1;
                }
                acc.combine(&row);
            }
        }

        let table = names
            .iter()
            .zip(merged)
            .map(|(name, (row, observers))| {
                let stats = row.into_snapshot();
                (name.clone(), ReducedProfile::new(name.clone(), stats, observers))
            })
            .collect();
        Ok(Some(table))
    }
}
