// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Name buffer codec
//!
//! Task names travel between participants as one fixed-stride byte buffer:
//! `slots` slots of `stride` bytes each, every name NUL-padded to the
//! stride. The stride is one more than the longest name in the group, so
//! every slot ends in at least one NUL. Decoding strips only that trailing
//! padding, so a NUL inside a name survives the trip. Names cannot end in
//! NUL, and unused slots are all NUL and are skipped.

use std::collections::BTreeSet;

use crate::error::{ReduceError, ReduceResult};

/// Encode `names` into `slots` slots of `stride` bytes
///
/// # Errors
///
/// Returns `ReduceError::MalformedExchange` if there are more names than
/// slots, a name does not fit in `stride - 1` bytes, or a name ends in NUL
/// and would not decode to itself.
pub fn encode_names<'a, I>(names: I, slots: usize, stride: usize) -> ReduceResult<Vec<u8>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut buffer = vec![0u8; slots * stride];
    for (index, name) in names.into_iter().enumerate() {
        if index >= slots {
            return Err(ReduceError::MalformedExchange(format!(
                "more than {} names for the agreed slot count",
                slots
            )));
        }
        let bytes = name.as_bytes();
        if bytes.last() == Some(&0) {
            return Err(ReduceError::MalformedExchange(format!(
                "name {:?} ends in NUL",
                name
            )));
        }
        if bytes.len() >= stride {
            return Err(ReduceError::MalformedExchange(format!(
                "name '{}' does not fit stride {}",
                name, stride
            )));
        }
        let start = index * stride;
        buffer[start..start + bytes.len()].copy_from_slice(bytes);
    }
    Ok(buffer)
}

/// Decode every non-empty slot of a gathered buffer into `into`
///
/// # Errors
///
/// Returns `ReduceError::MalformedExchange` if the buffer is not a whole
/// number of slots or a slot is not UTF-8.
pub fn decode_names_into(buffer: &[u8], stride: usize, into: &mut BTreeSet<String>) -> ReduceResult<()> {
    if buffer.is_empty() {
        return Ok(());
    }
    if stride == 0 || buffer.len() % stride != 0 {
        return Err(ReduceError::MalformedExchange(format!(
            "name buffer of {} bytes is not a multiple of stride {}",
            buffer.len(),
            stride
        )));
    }

    for slot in buffer.chunks(stride) {
        let Some(last) = slot.iter().rposition(|b| *b != 0) else {
            continue;
        };
        let end = last + 1;
        let name = std::str::from_utf8(&slot[..end])
            .map_err(|e| ReduceError::MalformedExchange(format!("name is not UTF-8: {}", e)))?;
        into.insert(name.to_string());
    }
    Ok(())
}

/// Decode a gathered buffer into a sorted, deduplicated name set
pub fn decode_names(buffer: &[u8], stride: usize) -> ReduceResult<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    decode_names_into(buffer, stride, &mut names)?;
    Ok(names)
}
