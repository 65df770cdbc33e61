// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use async_trait::async_trait;

use super::Communicator;
use crate::error::CommResult;

/// Communicator for a single-participant run
///
/// Every collective returns the caller's own buffer as the received result.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoloCommunicator;

#[async_trait]
impl Communicator for SoloCommunicator {
    fn participant_count(&self) -> usize {
        1
    }

    fn participant_id(&self) -> usize {
        0
    }

    async fn all_reduce_max(&self, values: &[u64]) -> CommResult<Vec<u64>> {
        Ok(values.to_vec())
    }

    async fn all_gather(&self, buffer: &[u8]) -> CommResult<Vec<u8>> {
        Ok(buffer.to_vec())
    }

    async fn gather_to_coordinator(&self, buffer: &[f64]) -> CommResult<Option<Vec<f64>>> {
        Ok(Some(buffer.to_vec()))
    }

    async fn barrier(&self) -> CommResult<()> {
        Ok(())
    }
}
