// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Group communication seam
//!
//! A reduction needs four collective operations. Every participant must
//! call them in the same order; a participant that skips one deadlocks the
//! group. Implementations:
//!
//! - [`SoloCommunicator`]: a single-participant run, every collective is a
//!   local echo of the caller's buffer
//! - [`LocalGroup`]: an in-process group of participants, one handle per
//!   participant, used to run multi-participant reductions on one machine
//!
//! Message-passing backends plug in by implementing [`Communicator`].

mod local_group;
mod solo;

pub use local_group::{LocalGroup, LocalParticipant};
pub use solo::SoloCommunicator;

use std::fmt;

use tracing::error;

use crate::error::CommResult;

/// Collective operations over a fixed group of participants
///
/// Buffers are concatenated in participant id order.
#[async_trait::async_trait]
pub trait Communicator: Send + Sync + fmt::Debug {
    /// Number of participants in the group
    fn participant_count(&self) -> usize;

    /// This participant's id, in `0..participant_count()`
    fn participant_id(&self) -> usize;

    /// Participant that receives gathered data
    fn coordinator(&self) -> usize {
        0
    }

    fn is_coordinator(&self) -> bool {
        self.participant_id() == self.coordinator()
    }

    /// Element-wise maximum across every participant's `values`
    ///
    /// # Errors
    ///
    /// Returns `CommError::LengthMismatch` if participants pass slices of
    /// different lengths.
    async fn all_reduce_max(&self, values: &[u64]) -> CommResult<Vec<u64>>;

    /// Every participant's `buffer`, concatenated, delivered to everyone
    async fn all_gather(&self, buffer: &[u8]) -> CommResult<Vec<u8>>;

    /// Every participant's `buffer`, concatenated, delivered to the
    /// coordinator only; other participants get `None`
    async fn gather_to_coordinator(&self, buffer: &[f64]) -> CommResult<Option<Vec<f64>>>;

    /// Wait until every participant reaches the barrier
    async fn barrier(&self) -> CommResult<()>;

    /// Terminate the run after an unrecoverable collective failure
    ///
    /// Backends override this to tear down the whole group; the default
    /// aborts the calling process.
    fn abort(&self, reason: &str) -> ! {
        error!(
            "Aborting participant {} of {}: {}",
            self.participant_id(),
            self.participant_count(),
            reason
        );
        std::process::abort()
    }
}
