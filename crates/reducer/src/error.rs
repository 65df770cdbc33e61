// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for profile reduction
//!
//! [`CommError`] is what a [`Communicator`](crate::Communicator) reports for
//! one collective call. [`ReduceError`] is what a reduction pass reports;
//! every collective failure is wrapped with the name of the step that
//! failed.

use thiserror::Error;

/// Result type alias for collective operations
pub type CommResult<T> = Result<T, CommError>;

/// Result type alias for reduction passes
pub type ReduceResult<T> = Result<T, ReduceError>;

/// Errors raised by a collective operation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommError {
    /// Participants contributed buffers of different lengths
    #[error("{operation}: expected {expected} elements, got {actual}")]
    LengthMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An earlier collective failed and the group can no longer agree
    #[error("Communication group poisoned by an earlier failure")]
    GroupPoisoned,

    /// The coordinator id does not name a participant
    #[error("Coordinator {coordinator} is outside a group of {size}")]
    InvalidCoordinator { coordinator: usize, size: usize },

    /// The underlying transport failed
    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Errors raised by a reduction pass
#[derive(Debug, Error)]
pub enum ReduceError {
    /// A collective step failed
    #[error("Collective {operation} failed: {source}")]
    Collective {
        operation: &'static str,
        #[source]
        source: CommError,
    },

    /// A gathered row does not have the fixed width
    #[error("Profile row has {actual} slots, expected {expected}")]
    RowWidth { expected: usize, actual: usize },

    /// Exchanged data does not match the agreed layout
    #[error("Malformed exchange: {0}")]
    MalformedExchange(String),
}

impl ReduceError {
    pub(crate) fn collective(operation: &'static str) -> impl FnOnce(CommError) -> ReduceError {
        move |source| ReduceError::Collective { operation, source }
    }
}
