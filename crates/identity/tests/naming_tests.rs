// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Name resolution tests through the public identity API

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use taskprof_identity::{
    IdentityTables, NamingConfig, ResolutionError, ResolutionResult, SymbolInfo, SymbolResolver,
    TaskGroup,
};

/// Resolver over a fixed symbol map that counts lookups
#[derive(Debug, Default)]
struct TableResolver {
    symbols: HashMap<usize, SymbolInfo>,
    lookups: AtomicUsize,
}

impl TableResolver {
    fn with(mut self, address: usize, info: SymbolInfo) -> Self {
        self.symbols.insert(address, info);
        self
    }
}

impl SymbolResolver for TableResolver {
    fn resolve_address(&self, address: usize) -> ResolutionResult<SymbolInfo> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        // widen the race window for concurrent first resolution
        thread::sleep(std::time::Duration::from_millis(5));
        self.symbols
            .get(&address)
            .cloned()
            .ok_or(ResolutionError::SymbolNotFound { address })
    }

    fn demangle(&self, raw_name: &str) -> String {
        match raw_name {
            "_Z5solvev" => "solve()".to_string(),
            "_Z6kernelPf" => "kernel(float*)".to_string(),
            other => other.to_string(),
        }
    }
}

fn tables_with(resolver: Arc<TableResolver>, config: NamingConfig) -> IdentityTables {
    IdentityTables::new(config, resolver).unwrap()
}

#[test]
fn test_address_resolves_through_demangler() {
    let resolver = Arc::new(TableResolver::default().with(0x1000, SymbolInfo::new("_Z5solvev")));
    let tables = tables_with(resolver.clone(), NamingConfig::default());
    let task = tables.get_or_create_address(0x1000);

    assert_eq!(task.get_name(false), "UNRESOLVED ADDR 0x1000");
    assert!(!task.is_resolved());
    assert_eq!(task.get_name(true), "solve()");
    assert!(task.is_resolved());
}

#[test]
fn test_resolution_happens_once_sequentially() {
    let resolver = Arc::new(TableResolver::default().with(0x1000, SymbolInfo::new("_Z5solvev")));
    let tables = tables_with(resolver.clone(), NamingConfig::default());
    let task = tables.get_or_create_address(0x1000);

    let names: Vec<String> = (0..10).map(|_| task.get_name(true)).collect();
    assert!(names.iter().all(|n| n == "solve()"));
    assert_eq!(resolver.lookups.load(Ordering::SeqCst), 1);
    assert_eq!(tables.resolver_lookups(), 1);
}

#[test]
fn test_resolution_happens_once_concurrently() {
    let resolver = Arc::new(TableResolver::default().with(0x2000, SymbolInfo::new("_Z5solvev")));
    let tables = tables_with(resolver.clone(), NamingConfig::default());
    let task = tables.get_or_create_address(0x2000);
    let barrier = Barrier::new(12);

    let names: Vec<String> = thread::scope(|s| {
        let handles: Vec<_> = (0..12)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    task.get_name(true)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(names.iter().all(|n| n == "solve()"));
    assert_eq!(resolver.lookups.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_lookup_degrades_to_placeholder() {
    let resolver = Arc::new(TableResolver::default());
    let tables = tables_with(resolver.clone(), NamingConfig::default());
    let task = tables.get_or_create_address(0xabc);

    assert_eq!(task.get_name(true), "UNRESOLVED ADDR 0xabc");
    // the failure is memoized too
    assert_eq!(task.get_name(true), "UNRESOLVED ADDR 0xabc");
    assert_eq!(resolver.lookups.load(Ordering::SeqCst), 1);
}

#[test]
fn test_null_address_is_never_looked_up() {
    let resolver = Arc::new(TableResolver::default());
    let tables = tables_with(resolver.clone(), NamingConfig::default());
    let task = tables.get_or_create_address(0);

    assert_eq!(task.get_name(true), "UNRESOLVED ADDR 0x0");
    assert_eq!(resolver.lookups.load(Ordering::SeqCst), 0);
}

#[test]
fn test_source_location_suffix() {
    let resolver = Arc::new(
        TableResolver::default().with(
            0x3000,
            SymbolInfo::new("_Z5solvev").with_location("solver.cpp", 17),
        ),
    );
    let tables = tables_with(resolver, NamingConfig::new().with_source_location(true));
    let task = tables.get_or_create_address(0x3000);

    assert_eq!(task.get_name(true), "solve() [solver.cpp:17]");
}

#[test]
fn test_embedded_address_in_name_is_resolved() {
    let resolver = Arc::new(TableResolver::default().with(0x4000, SymbolInfo::new("_Z5solvev")));
    let tables = tables_with(resolver, NamingConfig::default());
    let task = tables.get_or_create_name("task UNRESOLVED ADDR 0x4000");

    assert_eq!(task.get_name(false), "task UNRESOLVED ADDR 0x4000");
    assert_eq!(task.get_name(true), "task solve()");
}

#[test]
fn test_repeated_embedded_address_is_resolved_everywhere() {
    let resolver = Arc::new(TableResolver::default().with(0x4000, SymbolInfo::new("_Z5solvev")));
    let tables = tables_with(resolver.clone(), NamingConfig::default());
    let task = tables.get_or_create_name("UNRESOLVED ADDR 0x4000 => UNRESOLVED ADDR 0x4000");

    assert_eq!(task.get_name(true), "solve() => solve()");
    assert_eq!(resolver.lookups.load(Ordering::SeqCst), 1);
}

#[test]
fn test_openmp_name_keeps_address() {
    let resolver = Arc::new(TableResolver::default().with(0x5000, SymbolInfo::new("outlined")));
    let tables = tables_with(resolver, NamingConfig::default());
    let task = tables.get_or_create_name("OpenMP Parallel Region: UNRESOLVED ADDR 0x5000");

    assert_eq!(task.get_name(true), "OpenMP Parallel Region: outlined 0x5000");
}

#[test]
fn test_embedded_address_unknown_leaves_name() {
    let resolver = Arc::new(TableResolver::default());
    let tables = tables_with(resolver, NamingConfig::default());
    let task = tables.get_or_create_name("task UNRESOLVED ADDR 0x9999");

    assert_eq!(task.get_name(true), "task UNRESOLVED ADDR 0x9999");
}

#[test]
fn test_gpu_kernel_names_are_demangled() {
    let resolver = Arc::new(TableResolver::default());
    let tables = tables_with(resolver, NamingConfig::default());

    let gpu = tables.get_or_create_name("GPU: _Z6kernelPf");
    assert_eq!(gpu.get_name(true), "GPU: kernel(float*)");
    assert_eq!(gpu.group(), TaskGroup::Gpu);

    let launch = tables.get_or_create_name("cudaLaunchKernel: _Z6kernelPf");
    assert_eq!(launch.get_name(true), "cudaLaunchKernel: kernel(float*)");
    assert_eq!(launch.group(), TaskGroup::Cuda);

    let driver = tables.get_or_create_name("cuLaunchKernel: _Z6kernelPf");
    assert_eq!(driver.get_name(true), "cuLaunchKernel: kernel(float*)");
}

#[test]
fn test_short_name_uses_resolved_name() {
    let resolver = Arc::new(TableResolver::default().with(0x6000, SymbolInfo::new("_Z5solvev")));
    let tables = tables_with(resolver, NamingConfig::default());

    assert_eq!(tables.get_or_create_address(0x6000).short_name(), "solve");

    let long = format!("{}(int)", "x".repeat(70));
    let short = tables.get_or_create_name(&long).short_name();
    assert_eq!(short.chars().count(), 50);
    assert!(short.ends_with("..."));
}

#[test]
fn test_short_name_threshold_is_configurable() {
    let tables = tables_with(
        Arc::new(TableResolver::default()),
        NamingConfig::new().with_short_name_max_len(10),
    );
    assert_eq!(
        tables.get_or_create_name("abcdefghijklmnop").short_name(),
        "abcdefg..."
    );
}

#[test]
fn test_tree_name_applies_rules() {
    let tables = tables_with(
        Arc::new(TableResolver::default()),
        NamingConfig::new().with_tree_rule(r"^kok::p_for", "for"),
    );
    let task = tables.get_or_create_name("Kokkos::Impl::ParallelFor<Kokkos::TeamPolicy<>>");
    assert_eq!(task.tree_name(), "for<kok::team<>>");
    // resolution itself is untouched by display rules
    assert_eq!(task.get_name(true), "Kokkos::Impl::ParallelFor<Kokkos::TeamPolicy<>>");
}

#[test]
fn test_tree_name_disabled() {
    let tables = tables_with(
        Arc::new(TableResolver::default()),
        NamingConfig::new().with_short_task_names(false),
    );
    let task = tables.get_or_create_name("Kokkos::Impl::ParallelFor");
    assert_eq!(task.tree_name(), "Kokkos::Impl::ParallelFor");
}

#[test]
fn test_invalid_config_is_rejected() {
    let result = IdentityTables::new(
        NamingConfig::new().with_tree_rule("(", ""),
        Arc::new(TableResolver::default()),
    );
    assert!(result.is_err());
}
