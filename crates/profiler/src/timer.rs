// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Scoped timing of tasks
//!
//! # Example
//!
//! ```rust
//! use taskprof::Profiler;
//!
//! let profiler = Profiler::default();
//! {
//!     let _timer = profiler.start_timer("my_operation");
//!     // ... do work ...
//! } // elapsed time recorded here
//! assert_eq!(profiler.profile(profiler.task("my_operation")).unwrap().calls(), 1);
//! ```

use std::time::Instant;

use taskprof_identity::TaskId;
use taskprof_profile::{ProfileKind, Sample};

use crate::profiler::Profiler;

/// A scoped timer that measures one call of a task
///
/// Records the elapsed nanoseconds as a timer sample when dropped. A timer
/// marked with [`ScopedTimer::yielded`] records a pause instead of a
/// completed call.
#[derive(Debug)]
pub struct ScopedTimer<'a> {
    profiler: &'a Profiler,
    task: TaskId,
    start: Instant,
    yielded: bool,
    counters: Option<Vec<f64>>,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(profiler: &'a Profiler, task: TaskId) -> Self {
        Self {
            profiler,
            task,
            start: Instant::now(),
            yielded: false,
            counters: None,
        }
    }

    pub fn task(&self) -> TaskId {
        self.task
    }

    /// Record this interval as a pause rather than a completed call
    pub fn yielded(&mut self) {
        self.yielded = true;
    }

    /// Attach hardware counter deltas for this interval
    pub fn set_counters(&mut self, values: &[f64]) {
        self.counters = Some(values.to_vec());
    }

    /// Stop now instead of at the end of the scope
    pub fn stop(self) {}
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        let nanos = self.start.elapsed().as_nanos() as f64;
        let mut sample = Sample::timed(nanos, nanos);
        if let Some(counters) = &self.counters {
            sample = sample.with_counters(counters);
        }
        if self.yielded {
            sample = sample.yielded();
        }
        self.profiler.sample(self.task, ProfileKind::Timer, &sample);
    }
}

/// Time the rest of the enclosing scope
///
/// `timed_scope!("name")` uses the global profiler;
/// `timed_scope!(profiler, "name")` uses the given one.
///
/// # Example
///
/// ```rust
/// fn solve() {
///     taskprof::timed_scope!("solve");
///     // ... code ...
/// } // timing recorded here
/// # solve();
/// ```
#[macro_export]
macro_rules! timed_scope {
    ($name:expr) => {
        let _timer = $crate::Profiler::global().start_timer($name);
    };
    ($profiler:expr, $name:expr) => {
        let _timer = ($profiler).start_timer($name);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_timer_timing() {
        let profiler = Profiler::default();
        {
            let _timer = profiler.start_timer("test_operation");
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        let profile = profiler.profile(profiler.task("test_operation")).unwrap();
        assert_eq!(profile.calls(), 1);
        assert!(profile.accumulated() >= 10_000_000.0);
        assert!(profile.accumulated_seconds() >= 0.01);
    }

    #[test]
    fn test_yielded_timer_counts_stop_only() {
        let profiler = Profiler::default();
        let mut timer = profiler.start_timer("coroutine");
        timer.yielded();
        timer.stop();
        profiler.start_timer("coroutine").stop();

        let profile = profiler.profile(profiler.task("coroutine")).unwrap();
        assert_eq!(profile.stops(), 2);
        assert_eq!(profile.calls(), 1);
    }

    #[test]
    fn test_timer_counters() {
        let profiler = Profiler::default();
        let mut timer = profiler.start_timer("kernel");
        timer.set_counters(&[100.0, 7.0]);
        drop(timer);

        let counters = profiler.profile(profiler.task("kernel")).unwrap().counters();
        assert_eq!(counters[0], 100.0);
        assert_eq!(counters[1], 7.0);
    }

    #[test]
    fn test_timed_scope_macro() {
        let profiler = Profiler::default();
        {
            crate::timed_scope!(profiler, "macro_scope");
        }
        assert!(profiler.profile(profiler.task("macro_scope")).is_some());
    }
}
