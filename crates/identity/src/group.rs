// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Task groups
//!
//! Coarse subsystem buckets used by reporting collaborators to colour or
//! filter tasks. Classification looks only at the name prefix.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical subsystem a task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskGroup {
    Gpu,
    OpenMp,
    OpenAcc,
    Kokkos,
    Mpi,
    Cuda,
    Hip,
    Pthread,
    Hpx,
    /// Anything not matched by a known prefix
    User,
}

/// Prefix table, checked top to bottom
const PREFIXES: &[(&str, TaskGroup)] = &[
    ("GPU: ", TaskGroup::Gpu),
    ("OpenMP ", TaskGroup::OpenMp),
    ("OpenACC ", TaskGroup::OpenAcc),
    ("Kokkos", TaskGroup::Kokkos),
    ("MPI_", TaskGroup::Mpi),
    ("cuda", TaskGroup::Cuda),
    ("hip", TaskGroup::Hip),
    ("pthread", TaskGroup::Pthread),
    ("hpx", TaskGroup::Hpx),
];

impl TaskGroup {
    /// Classify a resolved task name
    pub fn classify(name: &str) -> Self {
        PREFIXES
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix))
            .map(|(_, group)| *group)
            .unwrap_or(TaskGroup::User)
    }

    /// Stable label for reports
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskGroup::Gpu => "GPU",
            TaskGroup::OpenMp => "OPENMP",
            TaskGroup::OpenAcc => "OPENACC",
            TaskGroup::Kokkos => "KOKKOS",
            TaskGroup::Mpi => "MPI",
            TaskGroup::Cuda => "CUDA",
            TaskGroup::Hip => "HIP",
            TaskGroup::Pthread => "PTHREAD",
            TaskGroup::Hpx => "HPX",
            TaskGroup::User => "USER",
        }
    }
}

impl fmt::Display for TaskGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
