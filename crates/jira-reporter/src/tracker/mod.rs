//! Tracker client contract
//!
//! The orchestrator only sees [`TrackerClient`]; [`jira::JiraClient`] is the
//! REST implementation. Tests substitute a recording mock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod jira;

pub use jira::JiraClient;

/// Errors from tracker operations
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Authentication failed, the project is missing, or the tracker is unreachable
    #[error("Tracker connection failed{}: {message}", status_suffix(.status))]
    Connection {
        status: Option<u16>,
        message: String,
    },

    /// The tracker rejected an issue; `payload` is its error body
    #[error("Issue creation failed{}: {payload}", status_suffix(.status))]
    IssueCreation {
        status: Option<u16>,
        payload: serde_json::Value,
    },

    #[error("Attachment {filename} failed: {message}")]
    Attachment { filename: String, message: String },

    /// The HTTP transport could not be built
    #[error("Tracker client error: {0}")]
    Client(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Project returned by the connectivity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub id: String,
    pub key: String,
    pub name: String,
}

/// Issue type available in a project, with the ids of its required fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueTypeInfo {
    pub name: String,
    #[serde(default)]
    pub required_fields: Vec<String>,
}

/// Everything needed to file one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueData {
    pub project_key: String,
    pub summary: String,
    pub description: String,
    pub issue_type: String,
    pub labels: Vec<String>,
}

/// Identifiers assigned by the tracker to a new issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub key: String,
    pub id: String,
}

/// Operations the issue filer needs from a tracker.
///
/// Every call is awaited to completion before the next one starts.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    /// Verify credentials and that the project exists.
    async fn check_connectivity(&self, project_key: &str) -> Result<ProjectInfo, TrackerError>;

    /// Issue types that can be created in the project.
    async fn list_issue_types(&self, project_key: &str)
        -> Result<Vec<IssueTypeInfo>, TrackerError>;

    async fn create_issue(&self, issue: &IssueData) -> Result<CreatedIssue, TrackerError>;

    async fn attach_file(
        &self,
        issue_key: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), TrackerError>;

    /// Human-facing URL of an issue.
    fn browse_url(&self, issue_key: &str) -> String;
}
