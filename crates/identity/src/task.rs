// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Task identifiers
//!
//! A [`TaskIdentifier`] is the canonical identity of one measured task. It is
//! created once by [`IdentityTables`](crate::IdentityTables), leaked to
//! `'static`, and handed out as a copyable [`TaskId`]. Profile records and
//! display caches hold `TaskId`s for the rest of the run, so identifiers are
//! never freed.
//!
//! ## Name resolution
//!
//! The raw identity (address or name) never changes. The display name is
//! resolved lazily on the first `get_name(true)` and memoized:
//!
//! ```text
//! get_name(true)
//!     ├─→ memoized? ── yes ──→ clone
//!     └─→ take resolution lock
//!           └─→ OnceLock::get_or_init(resolve)   (runs at most once)
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::NamingConfig;
use crate::group::TaskGroup;
use crate::resolver::SymbolResolver;
use crate::rules::{NameRuleSet, shorten};

/// Marker used in labels of addresses that have no symbol
pub const UNRESOLVED_MARKER: &str = "UNRESOLVED ADDR";

/// Prefixes after which the rest of a name is a mangled kernel symbol
const DEMANGLED_PREFIXES: &[&str] = &["GPU: ", "cudaLaunchKernel: ", "cuLaunchKernel: "];

const OPENMP_PREFIX: &str = "OpenMP ";

/// Label for an address that could not be resolved
pub fn unresolved_label(address: usize) -> String {
    format!("{} {:#x}", UNRESOLVED_MARKER, address)
}

/// Raw identity of a task
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskKey {
    /// Identified by code address
    Address(usize),
    /// Identified by name
    Name(String),
}

/// Naming state shared by every identifier of one table set
pub(crate) struct NamingContext {
    pub(crate) resolver: Arc<dyn SymbolResolver>,
    pub(crate) config: NamingConfig,
    pub(crate) tree_rules: NameRuleSet,
    /// Serializes resolver access; held only while resolving
    pub(crate) lock: Mutex<()>,
    pub(crate) lookups: AtomicU64,
}

impl NamingContext {
    fn lookup(&self, address: usize) -> Option<String> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        match self.resolver.resolve_address(address) {
            Ok(info) => {
                let mut name = self.resolver.demangle(&info.symbol);
                if self.config.include_source_location {
                    if let Some(location) = info.location() {
                        name.push_str(&format!(" [{}]", location));
                    }
                }
                Some(name)
            }
            Err(e) => {
                warn!("Failed to resolve task address {:#x}: {}", address, e);
                None
            }
        }
    }
}

/// Canonical identity of one measured task
pub struct TaskIdentifier {
    key: TaskKey,
    resolved: OnceLock<String>,
    naming: Arc<NamingContext>,
}

impl TaskIdentifier {
    pub(crate) fn new(key: TaskKey, naming: Arc<NamingContext>) -> Self {
        Self {
            key,
            resolved: OnceLock::new(),
            naming,
        }
    }

    /// Raw identity
    pub fn key(&self) -> &TaskKey {
        &self.key
    }

    /// Code address for address-identified tasks
    pub fn address(&self) -> Option<usize> {
        match self.key {
            TaskKey::Address(address) => Some(address),
            TaskKey::Name(_) => None,
        }
    }

    /// Whether the task was identified by name
    pub fn has_name(&self) -> bool {
        matches!(self.key, TaskKey::Name(_))
    }

    /// Whether the display name has already been resolved
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Display name of the task
    ///
    /// With `resolve == false` this is the raw label: the name itself, or the
    /// `UNRESOLVED ADDR 0x…` placeholder for addresses. With `resolve == true`
    /// the first call performs symbol lookup/cleanup and every later call
    /// returns the memoized result.
    pub fn get_name(&self, resolve: bool) -> String {
        if !resolve {
            return self.raw_label();
        }

        if let Some(name) = self.resolved.get() {
            return name.clone();
        }

        let _guard = self.naming.lock.lock();
        self.resolved.get_or_init(|| self.resolve()).clone()
    }

    /// Resolved name without argument lists or templates, length-capped
    pub fn short_name(&self) -> String {
        shorten(&self.get_name(true), self.naming.config.short_name_max_len)
    }

    /// Resolved name after the framework rewrite rules
    pub fn tree_name(&self) -> String {
        let name = self.get_name(true);
        if !self.naming.config.use_short_task_names {
            return name;
        }
        self.naming.tree_rules.apply(&name)
    }

    /// Subsystem bucket of the resolved name
    pub fn group(&self) -> TaskGroup {
        TaskGroup::classify(&self.get_name(true))
    }

    fn raw_label(&self) -> String {
        match &self.key {
            TaskKey::Address(address) => unresolved_label(*address),
            TaskKey::Name(name) => name.clone(),
        }
    }

    /// Runs under the resolution lock, at most once per identifier
    fn resolve(&self) -> String {
        let resolved = match &self.key {
            TaskKey::Address(0) => unresolved_label(0),
            TaskKey::Address(address) => self
                .naming
                .lookup(*address)
                .unwrap_or_else(|| unresolved_label(*address)),
            TaskKey::Name(name) => self.clean_name(name),
        };
        debug!("Resolved task {:?} to '{}'", self.key, resolved);
        resolved
    }

    fn clean_name(&self, name: &str) -> String {
        let mut name = name.to_string();

        if name.contains(UNRESOLVED_MARKER) {
            self.splice_embedded_address(&mut name);
        }

        for prefix in DEMANGLED_PREFIXES {
            if let Some(idx) = name.find(prefix) {
                let split = idx + prefix.len();
                let demangled = self.naming.resolver.demangle(&name[split..]);
                name.truncate(split);
                name.push_str(&demangled);
                break;
            }
        }

        name
    }

    /// Replace `UNRESOLVED ADDR 0x…` inside a name with the symbol it points at
    fn splice_embedded_address(&self, name: &mut String) {
        let Some(marker_at) = name.find(UNRESOLVED_MARKER) else {
            return;
        };
        let Some(addr_str) = name[marker_at + UNRESOLVED_MARKER.len()..]
            .split_whitespace()
            .next()
            .map(str::to_string)
        else {
            return;
        };
        let hex = addr_str.trim_start_matches("0x").trim_start_matches("0X");
        let Ok(address) = usize::from_str_radix(hex, 16) else {
            return;
        };
        let Some(symbol) = self.naming.lookup(address) else {
            return;
        };

        let with_address = format!("{} {}", UNRESOLVED_MARKER, addr_str);
        // Outlined OpenMP regions can share a symbol; the address keeps them apart.
        let target = if name.starts_with(OPENMP_PREFIX) && !symbol.contains(&addr_str) {
            UNRESOLVED_MARKER.to_string()
        } else {
            with_address
        };
        *name = name.replace(&target, &symbol);
    }
}

impl fmt::Debug for TaskIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskIdentifier")
            .field("key", &self.key)
            .field("resolved", &self.resolved.get())
            .finish()
    }
}

/// Copyable handle to an interned [`TaskIdentifier`]
///
/// Equality and hashing are by identity: two handles are equal exactly when
/// they point at the same canonical identifier.
#[derive(Clone, Copy)]
pub struct TaskId(&'static TaskIdentifier);

impl TaskId {
    pub(crate) fn new(identifier: &'static TaskIdentifier) -> Self {
        Self(identifier)
    }

    /// The underlying identifier
    pub fn identifier(&self) -> &'static TaskIdentifier {
        self.0
    }
}

impl Deref for TaskId {
    type Target = TaskIdentifier;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl PartialEq for TaskId {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl Eq for TaskId {}

impl Hash for TaskId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0 as *const TaskIdentifier as usize).hash(state);
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({:?})", self.0.key)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.raw_label())
    }
}
