// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Symbol resolution seam
//!
//! Address-identified tasks are named by asking a [`SymbolResolver`]. The
//! resolver is an external collaborator (debug-info readers, `dladdr`, a
//! symbol cache); this crate only needs lookup and demangling.

use std::fmt;

use crate::error::{ResolutionError, ResolutionResult};

/// Result of a successful address lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    /// Raw (possibly mangled) symbol name
    pub symbol: String,
    /// Source file, when debug info carries it
    pub file: Option<String>,
    /// Source line, when debug info carries it
    pub line: Option<u32>,
}

impl SymbolInfo {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            file: None,
            line: None,
        }
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// `file:line` when both are known
    pub fn location(&self) -> Option<String> {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        }
    }
}

/// Symbol lookup and demangling
///
/// Calls are serialized by the owning [`IdentityTables`](crate::IdentityTables),
/// so implementations backed by non-reentrant libraries need no locking of
/// their own.
pub trait SymbolResolver: Send + Sync + fmt::Debug {
    /// Map a code address to the symbol containing it
    fn resolve_address(&self, address: usize) -> ResolutionResult<SymbolInfo>;

    /// Turn a raw linker name into a display name
    ///
    /// The default leaves the name untouched.
    fn demangle(&self, raw_name: &str) -> String {
        raw_name.to_string()
    }
}

/// Resolver used when no symbol backend is configured
///
/// Every lookup fails, so address tasks keep their placeholder label.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl SymbolResolver for NullResolver {
    fn resolve_address(&self, address: usize) -> ResolutionResult<SymbolInfo> {
        Err(ResolutionError::SymbolNotFound { address })
    }
}
