// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock symbol resolver for testing

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use taskprof_identity::{ResolutionError, ResolutionResult, SymbolInfo, SymbolResolver};

/// Table-backed resolver that counts every lookup
///
/// Unknown addresses fail with `SymbolNotFound`. Demangling strips one
/// `mangled:` prefix, which is enough to observe that demangling ran.
#[derive(Debug, Default)]
pub struct MockResolver {
    symbols: RwLock<HashMap<usize, SymbolInfo>>,
    lookups: AtomicU64,
}

impl MockResolver {
    pub const MANGLED_PREFIX: &'static str = "mangled:";

    /// Create a new empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol at an address
    pub fn with_symbol(self, address: usize, symbol: &str) -> Self {
        self.symbols.write().insert(address, SymbolInfo::new(symbol));
        self
    }

    /// Add a symbol with source location at an address
    pub fn with_located_symbol(self, address: usize, symbol: &str, file: &str, line: u32) -> Self {
        self.symbols
            .write()
            .insert(address, SymbolInfo::new(symbol).with_location(file, line));
        self
    }

    /// Number of `resolve_address` calls so far
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl SymbolResolver for MockResolver {
    fn resolve_address(&self, address: usize) -> ResolutionResult<SymbolInfo> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.symbols
            .read()
            .get(&address)
            .cloned()
            .ok_or(ResolutionError::SymbolNotFound { address })
    }

    fn demangle(&self, raw_name: &str) -> String {
        raw_name
            .strip_prefix(Self::MANGLED_PREFIX)
            .unwrap_or(raw_name)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_known_symbol() {
        let resolver = MockResolver::new().with_symbol(0x10, "solve");
        assert_eq!(resolver.resolve_address(0x10).unwrap().symbol, "solve");
        assert_eq!(resolver.lookups(), 1);
    }

    #[test]
    fn test_unknown_symbol_fails() {
        let resolver = MockResolver::new();
        assert!(resolver.resolve_address(0x20).is_err());
        assert_eq!(resolver.lookups(), 1);
    }

    #[test]
    fn test_demangle_strips_prefix() {
        let resolver = MockResolver::new();
        assert_eq!(resolver.demangle("mangled:kernel"), "kernel");
        assert_eq!(resolver.demangle("kernel"), "kernel");
    }
}
