//! Run summary: totals plus per-group outcomes, and the exit status they imply.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use triage::RunTotals;

use crate::orchestrator::IssueOutcome;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub totals: RunTotals,
    /// One entry per failing group, in report order
    pub outcomes: Vec<IssueOutcome>,
}

impl RunSummary {
    pub fn new(totals: RunTotals, outcomes: Vec<IssueOutcome>) -> Self {
        Self { totals, outcomes }
    }

    pub fn issues_created(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn issues_failed(&self) -> usize {
        self.outcomes.len() - self.issues_created()
    }

    /// True when every failing group got an issue.
    pub fn all_filed(&self) -> bool {
        self.issues_failed() == 0
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.all_filed() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }

    /// Emit the run totals.
    pub fn log_totals(totals: &RunTotals) {
        info!(
            total = totals.total_tests,
            passed = totals.total_passed,
            failed = totals.failed(),
            duration = %format!("{:.2}s", totals.total_time_seconds),
            "Test results summary"
        );
    }

    /// Emit totals and one line per outcome.
    pub fn log(&self) {
        Self::log_totals(&self.totals);

        for outcome in &self.outcomes {
            match outcome {
                IssueOutcome::Success {
                    group_name,
                    issue_key,
                    issue_url,
                    ..
                } => info!(group = %group_name, key = %issue_key, url = %issue_url, "Issue created"),
                IssueOutcome::Failure {
                    group_name,
                    error_detail,
                } => {
                    let detail = serde_json::to_string_pretty(error_detail)
                        .unwrap_or_else(|_| error_detail.to_string());
                    error!(group = %group_name, "Failed to create issue:\n{detail}");
                }
            }
        }

        info!(
            created = self.issues_created(),
            failed = self.issues_failed(),
            "Issue filing complete"
        );
    }

    /// Write the summary as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run summary")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write run summary to {}", path.display()))
    }
}

/// Best-effort totals when the tracker integration is disabled.
///
/// Report problems are logged and never fail the run; `None` means the
/// report could not be summarized.
pub fn report_totals_only(report: &Path, summary_json: Option<&Path>) -> Option<RunSummary> {
    let aggregation = match triage::load_report(report) {
        Ok(aggregation) => aggregation,
        Err(e) => {
            warn!(error = %e, "Could not summarize test report");
            return None;
        }
    };

    RunSummary::log_totals(&aggregation.totals);
    let summary = RunSummary::new(aggregation.totals, Vec::new());
    if let Some(path) = summary_json {
        if let Err(e) = summary.write_json(path) {
            warn!("{e:#}");
        }
    }
    Some(summary)
}
