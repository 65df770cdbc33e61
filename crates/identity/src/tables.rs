// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Interning tables
//!
//! Two tables map raw identities to canonical [`TaskId`]s: one keyed by
//! address, one keyed by name. Insertion goes through the map's entry API,
//! which holds the shard lock while the identifier is created, so concurrent
//! first use of the same key yields exactly one identifier.
//!
//! A process-wide instance is available through [`IdentityTables::global`].
//! It is created on first use and lives until the process exits; call
//! [`IdentityTables::install_global`] before any instrumentation to give it a
//! real symbol resolver or a non-default naming configuration.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::config::NamingConfig;
use crate::error::NamingError;
use crate::resolver::{NullResolver, SymbolResolver};
use crate::rules::NameRuleSet;
use crate::task::{NamingContext, TaskId, TaskIdentifier, TaskKey};

static GLOBAL_TABLES: OnceLock<IdentityTables> = OnceLock::new();

/// Address and name interning tables sharing one naming context
pub struct IdentityTables {
    by_address: DashMap<usize, TaskId>,
    by_name: DashMap<String, TaskId>,
    naming: Arc<NamingContext>,
}

impl IdentityTables {
    /// Create tables with the given naming configuration and resolver
    ///
    /// # Errors
    ///
    /// Returns `NamingError` if the configuration fails validation.
    pub fn new(
        config: NamingConfig,
        resolver: Arc<dyn SymbolResolver>,
    ) -> Result<Self, NamingError> {
        config.validate()?;
        let tree_rules = NameRuleSet::with_extra(&config.extra_tree_rules)?;

        Ok(Self::from_parts(config, tree_rules, resolver))
    }

    /// Tables with default naming and no symbol backend
    pub fn with_defaults() -> Self {
        Self::from_parts(
            NamingConfig::default(),
            NameRuleSet::framework_defaults(),
            Arc::new(NullResolver),
        )
    }

    fn from_parts(
        config: NamingConfig,
        tree_rules: NameRuleSet,
        resolver: Arc<dyn SymbolResolver>,
    ) -> Self {
        Self {
            by_address: DashMap::new(),
            by_name: DashMap::new(),
            naming: Arc::new(NamingContext {
                resolver,
                config,
                tree_rules,
                lock: Mutex::new(()),
                lookups: AtomicU64::new(0),
            }),
        }
    }

    /// Install the process-wide tables
    ///
    /// Returns the tables back if the global instance already exists.
    pub fn install_global(tables: IdentityTables) -> Result<&'static IdentityTables, IdentityTables> {
        GLOBAL_TABLES.set(tables)?;
        Ok(Self::global())
    }

    /// The process-wide tables, created with defaults on first use
    pub fn global() -> &'static IdentityTables {
        GLOBAL_TABLES.get_or_init(IdentityTables::with_defaults)
    }

    /// Canonical identity for a code address
    pub fn get_or_create_address(&self, address: usize) -> TaskId {
        if let Some(id) = self.by_address.get(&address) {
            return *id;
        }
        *self
            .by_address
            .entry(address)
            .or_insert_with(|| self.intern(TaskKey::Address(address)))
    }

    /// Canonical identity for a task name
    pub fn get_or_create_name(&self, name: &str) -> TaskId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        *self
            .by_name
            .entry(name.to_string())
            .or_insert_with(|| self.intern(TaskKey::Name(name.to_string())))
    }

    /// Canonical identity for either kind of key
    pub fn get_or_create(&self, key: &TaskKey) -> TaskId {
        match key {
            TaskKey::Address(address) => self.get_or_create_address(*address),
            TaskKey::Name(name) => self.get_or_create_name(name),
        }
    }

    /// Existing identity for an address, without creating one
    pub fn lookup_address(&self, address: usize) -> Option<TaskId> {
        self.by_address.get(&address).map(|id| *id)
    }

    /// Existing identity for a name, without creating one
    pub fn lookup_name(&self, name: &str) -> Option<TaskId> {
        self.by_name.get(name).map(|id| *id)
    }

    pub fn address_count(&self) -> usize {
        self.by_address.len()
    }

    pub fn name_count(&self) -> usize {
        self.by_name.len()
    }

    /// Total number of interned identities
    pub fn len(&self) -> usize {
        self.address_count() + self.name_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of symbol lookups performed so far
    pub fn resolver_lookups(&self) -> u64 {
        self.naming.lookups.load(Ordering::Relaxed)
    }

    pub fn naming_config(&self) -> &NamingConfig {
        &self.naming.config
    }

    /// Called with the shard write lock held
    fn intern(&self, key: TaskKey) -> TaskId {
        debug!("Interning new task identity {:?}", key);
        let identifier: &'static TaskIdentifier =
            Box::leak(Box::new(TaskIdentifier::new(key, Arc::clone(&self.naming))));
        TaskId::new(identifier)
    }
}

impl Default for IdentityTables {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for IdentityTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityTables")
            .field("addresses", &self.address_count())
            .field("names", &self.name_count())
            .finish()
    }
}
