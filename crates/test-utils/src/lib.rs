// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for taskprof
//!
//! This crate provides common testing components including:
//! - A mock profile registry built from exact statistics
//! - A counting mock symbol resolver
//! - Snapshot fixtures
//! - Statistics assertions

pub mod assertions;
pub mod fixtures;
pub mod mock_registry;
pub mod mock_resolver;

// Re-exports for convenience
pub use assertions::ProfileAssertions;
pub use fixtures::ProfileFixtures;
pub use mock_registry::{MockRegistry, MockRegistryBuilder};
pub use mock_resolver::MockResolver;
