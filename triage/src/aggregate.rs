//! Result aggregation
//!
//! Computes run totals from group-level counters and extracts the failure
//! model. Totals never depend on how many `<testcase>` entries were parsed,
//! so reports with truncated case detail still reconcile.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ReportError, ReportResult};
use crate::model::{Aggregation, FailedGroup, FailedTest, RunTotals};
use crate::parser::{RawCase, RawDetail, RawSuite, RawSuiteTree};

const UNNAMED_GROUP: &str = "<unnamed group>";
const UNNAMED_TEST: &str = "<unnamed test>";

/// Build run totals and the ordered failure model from a decoded report.
///
/// Returns [`ReportError::InconsistentTotals`] when the declared failures
/// and errors exceed the declared test count, and [`ReportError::Malformed`]
/// when summed counters overflow.
///
/// Failing group names are unique in the result: a repeated name gets a
/// ` (2)`, ` (3)`, ... suffix in document order.
pub fn aggregate(tree: &RawSuiteTree) -> ReportResult<Aggregation> {
    let mut total_tests = 0u64;
    let mut total_failures = 0u64;
    let mut total_errors = 0u64;
    let mut failed_groups = Vec::new();
    let mut used_names = HashSet::new();

    for suite in &tree.suites {
        let failures = parse_count(suite.failures.as_deref());
        let errors = parse_count(suite.errors.as_deref());

        total_tests = add_count(total_tests, parse_count(suite.tests.as_deref()), "tests")?;
        total_failures = add_count(total_failures, failures, "failures")?;
        total_errors = add_count(total_errors, errors, "errors")?;

        if failures > 0 || errors > 0 {
            let mut group = failed_group(suite, failures, errors);
            group.name = unique_name(group.name, &mut used_names);
            failed_groups.push(group);
        }
    }

    let failed = add_count(total_failures, total_errors, "failures and errors")?;
    let total_passed = total_tests
        .checked_sub(failed)
        .ok_or(ReportError::InconsistentTotals {
            tests: total_tests,
            failures: total_failures,
            errors: total_errors,
        })?;

    let totals = RunTotals {
        total_tests,
        total_failures,
        total_errors,
        total_passed,
        total_time_seconds: parse_seconds(tree.time.as_deref()),
    };

    debug!(
        tests = totals.total_tests,
        failures = totals.total_failures,
        errors = totals.total_errors,
        failed_groups = failed_groups.len(),
        "Aggregated test report"
    );

    Ok(Aggregation {
        totals,
        failed_groups,
    })
}

fn add_count(total: u64, value: u64, counter: &str) -> ReportResult<u64> {
    total
        .checked_add(value)
        .ok_or_else(|| ReportError::malformed(format!("total {counter} count overflows")))
}

/// Suffix repeated names so each failing group keeps its own issue key.
fn unique_name(name: String, used: &mut HashSet<String>) -> String {
    if used.insert(name.clone()) {
        return name;
    }

    let mut n = 2u64;
    loop {
        let candidate = format!("{name} ({n})");
        if used.insert(candidate.clone()) {
            warn!(group = %name, renamed = %candidate, "Duplicate failing group name");
            return candidate;
        }
        n += 1;
    }
}

fn failed_group(suite: &RawSuite, failures: u64, errors: u64) -> FailedGroup {
    let name = suite
        .name
        .clone()
        .unwrap_or_else(|| UNNAMED_GROUP.to_string());

    let tests: Vec<FailedTest> = suite
        .cases
        .iter()
        .filter(|case| case.is_failing())
        .map(failed_test)
        .collect();

    if tests.is_empty() {
        warn!(group = %name, failures, errors, "Group reports failures without per-test detail");
    }

    FailedGroup {
        name,
        failure_count: failures,
        error_count: errors,
        time_seconds: parse_seconds(suite.time.as_deref()),
        tests,
    }
}

fn failed_test(case: &RawCase) -> FailedTest {
    let failure = case.failures.first().map(detail_message).unwrap_or_default();
    let message = if failure.is_empty() {
        case.errors.first().map(detail_message).unwrap_or_default()
    } else {
        failure
    };

    FailedTest {
        name: case.name.clone().unwrap_or_else(|| UNNAMED_TEST.to_string()),
        message,
    }
}

/// Text content when present, otherwise the element's attributes as JSON.
fn detail_message(detail: &RawDetail) -> String {
    if let Some(text) = detail.text.as_deref().filter(|t| !t.trim().is_empty()) {
        return text.to_string();
    }

    let mut attrs = Map::new();
    if let Some(message) = &detail.message {
        attrs.insert("message".into(), Value::String(message.clone()));
    }
    if let Some(kind) = &detail.kind {
        attrs.insert("type".into(), Value::String(kind.clone()));
    }
    if attrs.is_empty() {
        return String::new();
    }
    Value::Object(attrs).to_string()
}

/// Unsigned counter; missing or unparsable values count as zero.
fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(0)
}

fn parse_seconds(raw: Option<&str>) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
