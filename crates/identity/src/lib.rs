// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # taskprof - Task Identity
//!
//! Canonical, interned identities for measured tasks.
//!
//! ## Overview
//!
//! - [`IdentityTables`]: address and name interning tables
//! - [`TaskId`] / [`TaskIdentifier`]: the identity and its lazy display names
//! - [`SymbolResolver`]: external symbol lookup and demangling
//! - [`NameRuleSet`]: ordered regex rewrites for tree display names
//! - [`TaskGroup`]: prefix-based subsystem classification
//!
//! ## Usage
//!
//! ```rust
//! use taskprof_identity::{IdentityTables, TaskGroup};
//!
//! let tables = IdentityTables::with_defaults();
//! let task = tables.get_or_create_name("MPI_Allreduce");
//!
//! assert_eq!(task, tables.get_or_create_name("MPI_Allreduce"));
//! assert_eq!(task.get_name(true), "MPI_Allreduce");
//! assert_eq!(task.group(), TaskGroup::Mpi);
//! ```

pub mod config;
pub mod error;
pub mod group;
pub mod resolver;
pub mod rules;
pub mod tables;
pub mod task;

// Re-exports
pub use config::{NamingConfig, RuleSpec, DEFAULT_SHORT_NAME_MAX_LEN};
pub use error::{NamingError, ResolutionError, ResolutionResult};
pub use group::TaskGroup;
pub use resolver::{NullResolver, SymbolInfo, SymbolResolver};
pub use rules::{NameRule, NameRuleSet, TRUNCATION_MARKER, shorten};
pub use tables::IdentityTables;
pub use task::{TaskId, TaskIdentifier, TaskKey, UNRESOLVED_MARKER, unresolved_label};
