//! Issue filing loop: one tracker issue per failing group.
//!
//! Groups are processed strictly in order, one at a time: render content,
//! create the issue, then upload each artifact. A failed create is recorded
//! and the loop moves on; a failed upload is only logged.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use triage::{FailedGroup, RunTotals};

use crate::artifacts::Artifact;
use crate::content::{render_description, render_summary, RunContext};
use crate::tracker::{IssueData, TrackerClient, TrackerError};

/// Labels applied when none are configured.
pub const DEFAULT_LABELS: &[&str] = &["automated-test", "api-test", "newman", "postman"];

/// Per-run settings shared by every issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSettings {
    pub project_key: String,
    pub issue_type: String,
    pub labels: Vec<String>,
}

/// Result of filing the issue for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IssueOutcome {
    Success {
        group_name: String,
        issue_key: String,
        issue_id: String,
        issue_url: String,
    },
    Failure {
        group_name: String,
        /// The tracker's error payload, or the transport error text
        error_detail: serde_json::Value,
    },
}

impl IssueOutcome {
    pub fn group_name(&self) -> &str {
        match self {
            Self::Success { group_name, .. } | Self::Failure { group_name, .. } => group_name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// File one issue per failing group, in order.
///
/// Always returns exactly one outcome per entry of `groups`, in the same
/// order. Never fails as a whole: per-group errors become
/// [`IssueOutcome::Failure`].
pub async fn create_issues_for_failures(
    tracker: &dyn TrackerClient,
    settings: &IssueSettings,
    totals: &RunTotals,
    groups: &[FailedGroup],
    artifacts: &[Artifact],
    ctx: &RunContext,
) -> Vec<IssueOutcome> {
    let mut outcomes = Vec::with_capacity(groups.len());

    for (index, group) in groups.iter().enumerate() {
        info!(
            group = %group.name,
            position = index + 1,
            of = groups.len(),
            "Creating issue"
        );
        let outcome = file_group(tracker, settings, totals, group, artifacts, ctx).await;
        outcomes.push(outcome);
    }

    outcomes
}

async fn file_group(
    tracker: &dyn TrackerClient,
    settings: &IssueSettings,
    totals: &RunTotals,
    group: &FailedGroup,
    artifacts: &[Artifact],
    ctx: &RunContext,
) -> IssueOutcome {
    let issue = IssueData {
        project_key: settings.project_key.clone(),
        summary: render_summary(group),
        description: render_description(group, totals, ctx),
        issue_type: settings.issue_type.clone(),
        labels: settings.labels.clone(),
    };

    let created = match tracker.create_issue(&issue).await {
        Ok(created) => created,
        Err(e) => {
            error!(group = %group.name, error = %e, "Issue creation failed");
            return IssueOutcome::Failure {
                group_name: group.name.clone(),
                error_detail: error_detail(e),
            };
        }
    };

    let failed_uploads = attach_artifacts(tracker, &created.key, artifacts).await;
    if failed_uploads > 0 {
        warn!(
            issue = %created.key,
            failed = failed_uploads,
            total = artifacts.len(),
            "Could not attach every report to the issue"
        );
    } else if !artifacts.is_empty() {
        info!(issue = %created.key, count = artifacts.len(), "Reports attached");
    }

    IssueOutcome::Success {
        group_name: group.name.clone(),
        issue_url: tracker.browse_url(&created.key),
        issue_key: created.key,
        issue_id: created.id,
    }
}

/// Upload each artifact independently. Returns how many uploads failed.
async fn attach_artifacts(
    tracker: &dyn TrackerClient,
    issue_key: &str,
    artifacts: &[Artifact],
) -> usize {
    let mut failed = 0;
    for artifact in artifacts {
        if let Err(e) = tracker
            .attach_file(issue_key, &artifact.filename, &artifact.bytes)
            .await
        {
            warn!(issue = %issue_key, file = %artifact.filename, error = %e, "Attachment failed");
            failed += 1;
        }
    }
    failed
}

fn error_detail(err: TrackerError) -> serde_json::Value {
    match err {
        TrackerError::IssueCreation { payload, .. } => payload,
        other => serde_json::Value::String(other.to_string()),
    }
}
