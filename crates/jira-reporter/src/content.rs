//! Issue content rendering
//!
//! Pure functions from the failure model to Jira wiki markup. Nothing here
//! reads the clock or the environment; the caller supplies a [`RunContext`].

use std::fmt::Write as _;

use chrono::{DateTime, Local};
use triage::{FailedGroup, RunTotals};

/// Prefix marking issues filed by this tool.
pub const SUMMARY_PREFIX: &str = "[Automated]";

/// Run-wide values shown in every issue footer.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub generated_at: DateTime<Local>,
    /// System under test, when configured
    pub target_system: Option<String>,
}

impl RunContext {
    pub fn now(target_system: Option<String>) -> Self {
        Self {
            generated_at: Local::now(),
            target_system,
        }
    }
}

/// One-line issue summary: group name and failing test count.
pub fn render_summary(group: &FailedGroup) -> String {
    format!(
        "{SUMMARY_PREFIX} {} - {} test(s) failed",
        group.name,
        group.failing_test_count()
    )
}

/// Issue description for one failing group.
pub fn render_description(group: &FailedGroup, totals: &RunTotals, ctx: &RunContext) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "*Test Group Failed: {}*\n", group.name);
    let _ = writeln!(
        out,
        "Failures: {} | Errors: {} | Time: {}s\n",
        group.failure_count, group.error_count, group.time_seconds
    );
    let _ = writeln!(out, "*Failed Tests*\n");

    if group.tests.is_empty() {
        let _ = writeln!(out, "_No per-test detail was recorded in the report._\n");
    }
    for (i, test) in group.tests.iter().enumerate() {
        let _ = writeln!(out, "{}. *{}*", i + 1, test.name);
        if !test.message.is_empty() {
            let _ = writeln!(out, "{{code}}{}{{code}}\n", test.message);
        }
    }

    let _ = writeln!(out, "----");
    let _ = writeln!(out, "*Execution Summary*");
    let _ = writeln!(
        out,
        "Total Tests: {} | Passed: {} | Failed: {} | Duration: {:.2}s",
        totals.total_tests,
        totals.total_passed,
        totals.failed(),
        totals.total_time_seconds
    );

    let generated = ctx.generated_at.format("%d/%m/%Y %H:%M:%S");
    match &ctx.target_system {
        Some(target) => {
            let _ = writeln!(out, "Generated: {generated} | Target: {target}");
        }
        None => {
            let _ = writeln!(out, "Generated: {generated}");
        }
    }

    out
}
