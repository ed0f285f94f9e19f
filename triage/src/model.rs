//! Normalized failure model produced by the aggregator.

use serde::{Deserialize, Serialize};

/// Run-wide counters, summed from each group's declared counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTotals {
    pub total_tests: u64,
    pub total_failures: u64,
    pub total_errors: u64,
    /// `total_tests - total_failures - total_errors`, never negative
    pub total_passed: u64,
    /// Run-level duration as reported by the test driver
    pub total_time_seconds: f64,
}

impl RunTotals {
    /// Failures and errors combined.
    pub fn failed(&self) -> u64 {
        self.total_failures + self.total_errors
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// A group whose own failure or error counter is non-zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedGroup {
    /// Correlation key: at most one issue is filed per name per run
    pub name: String,
    pub failure_count: u64,
    pub error_count: u64,
    pub time_seconds: f64,
    /// Failing cases in document order; may be empty when the report
    /// carries counters without per-case detail
    pub tests: Vec<FailedTest>,
}

impl FailedGroup {
    /// Number of failing tests to advertise for this group.
    ///
    /// Falls back to the declared counters when no per-case detail was found.
    pub fn failing_test_count(&self) -> u64 {
        if self.tests.is_empty() {
            self.failure_count + self.error_count
        } else {
            self.tests.len() as u64
        }
    }
}

/// A single failing test case and its diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTest {
    pub name: String,
    pub message: String,
}

/// Output of [`crate::aggregate::aggregate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub totals: RunTotals,
    pub failed_groups: Vec<FailedGroup>,
}
