// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for task identity
//!
//! Resolution failures never leave this crate: `TaskIdentifier::get_name`
//! turns them into a placeholder label. They are still typed so that
//! `SymbolResolver` implementations can say what went wrong.

use thiserror::Error;

/// Result type alias for symbol resolution
pub type ResolutionResult<T> = Result<T, ResolutionError>;

/// Errors a [`SymbolResolver`](crate::SymbolResolver) may report
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// No symbol covers the address
    #[error("No symbol found for address {address:#x}")]
    SymbolNotFound { address: usize },

    /// The resolver backend could not be used at all
    #[error("Symbol resolver unavailable: {0}")]
    ResolverUnavailable(String),
}

/// Errors raised while building naming configuration
#[derive(Debug, Error)]
pub enum NamingError {
    /// A tree-name rule pattern failed to compile
    #[error("Invalid name rule pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The short-name threshold cannot hold the truncation marker
    #[error("short_name_max_len must be at least {min}, got {actual}")]
    ShortNameTooSmall { min: usize, actual: usize },
}
