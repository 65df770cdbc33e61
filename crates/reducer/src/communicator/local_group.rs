// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! In-process participant group
//!
//! Each collective is one exchange round: every participant writes its
//! contribution into its own slot, waits on a shared barrier, reads every
//! slot, then waits again so no participant can overwrite a slot another
//! one has not read yet.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Barrier;
use tracing::trace;

use super::Communicator;
use crate::error::{CommError, CommResult};

#[derive(Debug, Clone)]
enum Payload {
    Max(Vec<u64>),
    Bytes(Vec<u8>),
    Rows(Vec<f64>),
    Sync,
}

impl Payload {
    fn len(&self) -> usize {
        match self {
            Payload::Max(values) => values.len(),
            Payload::Bytes(bytes) => bytes.len(),
            Payload::Rows(rows) => rows.len(),
            Payload::Sync => 0,
        }
    }
}

#[derive(Debug)]
struct GroupState {
    size: usize,
    coordinator: usize,
    barrier: Barrier,
    slots: Mutex<Vec<Option<Payload>>>,
    poisoned: AtomicBool,
}

/// A group of participants living in one process
///
/// ```rust
/// use taskprof_reducer::{Communicator, LocalGroup};
///
/// let group = LocalGroup::new(3);
/// let participants = group.participants();
/// assert_eq!(participants.len(), 3);
/// assert!(participants[0].is_coordinator());
/// ```
#[derive(Debug, Clone)]
pub struct LocalGroup {
    state: Arc<GroupState>,
}

impl LocalGroup {
    /// Create a group of `size` participants coordinated by participant 0
    ///
    /// A size of zero is treated as one.
    pub fn new(size: usize) -> Self {
        Self::build(size.max(1), 0)
    }

    /// Create a group with an explicit coordinator
    ///
    /// # Errors
    ///
    /// Returns `CommError::InvalidCoordinator` if `coordinator >= size`.
    pub fn with_coordinator(size: usize, coordinator: usize) -> CommResult<Self> {
        let size = size.max(1);
        if coordinator >= size {
            return Err(CommError::InvalidCoordinator { coordinator, size });
        }
        Ok(Self::build(size, coordinator))
    }

    fn build(size: usize, coordinator: usize) -> Self {
        Self {
            state: Arc::new(GroupState {
                size,
                coordinator,
                barrier: Barrier::new(size),
                slots: Mutex::new(vec![None; size]),
                poisoned: AtomicBool::new(false),
            }),
        }
    }

    pub fn size(&self) -> usize {
        self.state.size
    }

    /// One handle per participant, in id order
    pub fn participants(&self) -> Vec<LocalParticipant> {
        (0..self.state.size)
            .map(|id| LocalParticipant {
                id,
                state: Arc::clone(&self.state),
            })
            .collect()
    }

    /// Handle for participant `id`
    pub fn participant(&self, id: usize) -> Option<LocalParticipant> {
        (id < self.state.size).then(|| LocalParticipant {
            id,
            state: Arc::clone(&self.state),
        })
    }

    /// Make every later collective fail with `GroupPoisoned`
    ///
    /// Participants already waiting inside a round are not woken.
    pub fn poison(&self) {
        self.state.poisoned.store(true, Ordering::SeqCst);
    }

    pub fn is_poisoned(&self) -> bool {
        self.state.poisoned.load(Ordering::SeqCst)
    }
}

/// One participant's view of a [`LocalGroup`]
#[derive(Debug, Clone)]
pub struct LocalParticipant {
    id: usize,
    state: Arc<GroupState>,
}

impl LocalParticipant {
    fn check_poisoned(&self) -> CommResult<()> {
        if self.state.poisoned.load(Ordering::SeqCst) {
            return Err(CommError::GroupPoisoned);
        }
        Ok(())
    }

    /// Run one exchange round and return every contribution in id order
    async fn exchange(&self, operation: &'static str, payload: Payload) -> CommResult<Vec<Payload>> {
        self.check_poisoned()?;
        trace!(
            "Participant {} entering {} with {} elements",
            self.id,
            operation,
            payload.len()
        );

        {
            let mut slots = self.state.slots.lock();
            slots[self.id] = Some(payload);
        }
        self.state.barrier.wait().await;

        let received: Vec<Option<Payload>> = self.state.slots.lock().clone();
        self.state.barrier.wait().await;

        received
            .into_iter()
            .map(|slot| slot.ok_or(CommError::GroupPoisoned))
            .collect()
    }

    /// Fail the round for everyone if contributions differ in length
    ///
    /// Every participant reads the same slots, so they all reach the same
    /// verdict.
    fn check_lengths(&self, operation: &'static str, payloads: &[Payload]) -> CommResult<()> {
        let expected = payloads.first().map(Payload::len).unwrap_or(0);
        if let Some(bad) = payloads.iter().find(|p| p.len() != expected) {
            self.state.poisoned.store(true, Ordering::SeqCst);
            return Err(CommError::LengthMismatch {
                operation,
                expected,
                actual: bad.len(),
            });
        }
        Ok(())
    }

    fn unexpected(&self, operation: &'static str) -> CommError {
        self.state.poisoned.store(true, Ordering::SeqCst);
        CommError::Transport(format!("{}: participants called different operations", operation))
    }
}

#[async_trait]
impl Communicator for LocalParticipant {
    fn participant_count(&self) -> usize {
        self.state.size
    }

    fn participant_id(&self) -> usize {
        self.id
    }

    fn coordinator(&self) -> usize {
        self.state.coordinator
    }

    async fn all_reduce_max(&self, values: &[u64]) -> CommResult<Vec<u64>> {
        const OP: &str = "all_reduce_max";
        let payloads = self.exchange(OP, Payload::Max(values.to_vec())).await?;
        self.check_lengths(OP, &payloads)?;

        let mut result = values.to_vec();
        for payload in &payloads {
            let Payload::Max(other) = payload else {
                return Err(self.unexpected(OP));
            };
            for (acc, value) in result.iter_mut().zip(other) {
                *acc = (*acc).max(*value);
            }
        }
        Ok(result)
    }

    async fn all_gather(&self, buffer: &[u8]) -> CommResult<Vec<u8>> {
        const OP: &str = "all_gather";
        let payloads = self.exchange(OP, Payload::Bytes(buffer.to_vec())).await?;
        self.check_lengths(OP, &payloads)?;

        let mut result = Vec::with_capacity(buffer.len() * payloads.len());
        for payload in &payloads {
            let Payload::Bytes(bytes) = payload else {
                return Err(self.unexpected(OP));
            };
            result.extend_from_slice(bytes);
        }
        Ok(result)
    }

    async fn gather_to_coordinator(&self, buffer: &[f64]) -> CommResult<Option<Vec<f64>>> {
        const OP: &str = "gather_to_coordinator";
        let payloads = self.exchange(OP, Payload::Rows(buffer.to_vec())).await?;
        self.check_lengths(OP, &payloads)?;

        let mut result = Vec::with_capacity(buffer.len() * payloads.len());
        for payload in &payloads {
            let Payload::Rows(rows) = payload else {
                return Err(self.unexpected(OP));
            };
            result.extend_from_slice(rows);
        }
        Ok(self.is_coordinator().then_some(result))
    }

    async fn barrier(&self) -> CommResult<()> {
        const OP: &str = "barrier";
        let payloads = self.exchange(OP, Payload::Sync).await?;
        if payloads.iter().any(|p| !matches!(p, Payload::Sync)) {
            return Err(self.unexpected(OP));
        }
        Ok(())
    }
}
