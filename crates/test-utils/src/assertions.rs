// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Custom assertions for profile statistics

use taskprof_profile::ProfileSnapshot;

/// Default tolerance for floating point comparisons
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Assertion helpers for profile statistics
pub struct ProfileAssertions;

impl ProfileAssertions {
    /// Assert two floats are within `epsilon`
    pub fn assert_close(actual: f64, expected: f64, epsilon: f64) {
        assert!(
            (actual - expected).abs() <= epsilon,
            "Expected {} to be within {} of {}",
            actual,
            epsilon,
            expected
        );
    }

    /// Assert two snapshots agree in every field
    ///
    /// The minimum is compared as reported, so a reset sentinel equals 0.
    /// Totals are compared within [`DEFAULT_EPSILON`].
    pub fn assert_same_statistics(actual: &ProfileSnapshot, expected: &ProfileSnapshot) {
        assert_eq!(actual.kind, expected.kind, "kind differs");
        assert_eq!(actual.calls, expected.calls, "calls differ");
        assert_eq!(actual.stops, expected.stops, "stops differ");
        Self::assert_close(actual.accumulated, expected.accumulated, DEFAULT_EPSILON);
        Self::assert_close(
            actual.inclusive_accumulated,
            expected.inclusive_accumulated,
            DEFAULT_EPSILON,
        );
        Self::assert_close(actual.sum_of_squares, expected.sum_of_squares, DEFAULT_EPSILON);
        Self::assert_close(actual.minimum(), expected.minimum(), DEFAULT_EPSILON);
        Self::assert_close(actual.maximum, expected.maximum, DEFAULT_EPSILON);
        for (index, (a, e)) in actual.counters.iter().zip(&expected.counters).enumerate() {
            assert!(
                (a - e).abs() <= DEFAULT_EPSILON,
                "counter {} differs: {} vs {}",
                index,
                a,
                e
            );
        }
        assert_eq!(actual.allocations, expected.allocations, "allocations differ");
        assert_eq!(actual.frees, expected.frees, "frees differ");
        assert_eq!(actual.bytes_allocated, expected.bytes_allocated, "bytes allocated differ");
        assert_eq!(actual.bytes_freed, expected.bytes_freed, "bytes freed differ");
        assert_eq!(actual.num_threads, expected.num_threads, "thread counts differ");
        assert_eq!(actual.times_reset, expected.times_reset, "reset counts differ");
        assert_eq!(actual.throttled, expected.throttled, "throttled flags differ");
    }

    /// Assert mean is NaN for a profile without calls, else the expected value
    pub fn assert_mean(snapshot: &ProfileSnapshot, expected: Option<f64>) {
        match expected {
            Some(expected) => Self::assert_close(snapshot.mean(), expected, 1e-6),
            None => assert!(snapshot.mean().is_nan(), "Expected NaN mean, got {}", snapshot.mean()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::ProfileFixtures;

    #[test]
    fn test_assert_close() {
        ProfileAssertions::assert_close(1.0, 1.0 + 1e-12, DEFAULT_EPSILON);
    }

    #[test]
    #[should_panic]
    fn test_assert_close_fails() {
        ProfileAssertions::assert_close(1.0, 1.1, DEFAULT_EPSILON);
    }

    #[test]
    fn test_same_statistics() {
        let a = ProfileFixtures::timer(3, 9.0);
        let mut b = a.clone();
        b.accumulated += 1e-12;
        ProfileAssertions::assert_same_statistics(&a, &b);
        ProfileAssertions::assert_mean(&a, Some(3.0));
    }

    #[test]
    #[should_panic(expected = "thread counts differ")]
    fn test_same_statistics_checks_threads() {
        let a = ProfileFixtures::timer(3, 9.0);
        let mut b = a.clone();
        b.num_threads = 2;
        ProfileAssertions::assert_same_statistics(&a, &b);
    }

    #[test]
    #[should_panic]
    fn test_same_statistics_checks_inclusive() {
        let a = ProfileFixtures::timer(3, 9.0);
        let mut b = a.clone();
        b.inclusive_accumulated = 14.0;
        ProfileAssertions::assert_same_statistics(&a, &b);
    }

    #[test]
    #[should_panic(expected = "reset counts differ")]
    fn test_same_statistics_checks_resets() {
        let a = ProfileFixtures::timer(3, 9.0);
        let mut b = a.clone();
        b.times_reset = 4;
        ProfileAssertions::assert_same_statistics(&a, &b);
    }
}
