//! Checks that must pass before any issue is filed.

use thiserror::Error;
use tracing::info;

use crate::tracker::{ProjectInfo, TrackerClient, TrackerError};

/// Fatal preflight failures; no group is processed after one of these.
#[derive(Debug, Error)]
pub enum PreflightError {
    #[error(transparent)]
    Connection(#[from] TrackerError),

    #[error("Issue type \"{requested}\" not found in project {project}; available: {}", .available.join(", "))]
    UnknownIssueType {
        project: String,
        requested: String,
        available: Vec<String>,
    },
}

/// Verify connectivity, then that `issue_type` exists in the project.
pub async fn preflight(
    tracker: &dyn TrackerClient,
    project_key: &str,
    issue_type: &str,
) -> Result<ProjectInfo, PreflightError> {
    let project = tracker.check_connectivity(project_key).await?;
    info!(project = %project.name, key = %project.key, "Project found");

    let types = tracker.list_issue_types(project_key).await?;
    let available: Vec<String> = types.iter().map(|t| t.name.clone()).collect();
    info!(types = %available.join(", "), "Available issue types");

    let Some(chosen) = types.iter().find(|t| t.name == issue_type) else {
        return Err(PreflightError::UnknownIssueType {
            project: project_key.to_string(),
            requested: issue_type.to_string(),
            available,
        });
    };

    info!(issue_type, "Issue type is valid");
    if !chosen.required_fields.is_empty() {
        info!(
            issue_type,
            fields = %chosen.required_fields.join(", "),
            "Required fields for issue type"
        );
    }

    Ok(project)
}
