//! Test report triage
//!
//! Deterministic half of the failure-to-issue pipeline:
//! - `parser`: decodes a JUnit-style XML report into a raw suite tree
//! - `aggregate`: reconciles run totals and extracts one record per failing group
//! - `model`: the normalized failure model shared with issue filing
//!
//! Nothing in this crate touches the network or the process environment.

pub mod aggregate;
pub mod error;
pub mod model;
pub mod parser;

pub use aggregate::aggregate;
pub use error::{ReportError, ReportResult};
pub use model::{Aggregation, FailedGroup, FailedTest, RunTotals};
pub use parser::{parse_file, parse_str, RawCase, RawDetail, RawSuite, RawSuiteTree};

/// Parse the report at `path` and aggregate it in one step.
pub fn load_report(path: &std::path::Path) -> ReportResult<Aggregation> {
    aggregate(&parse_file(path)?)
}
