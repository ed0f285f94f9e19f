//! Jira issue filing for failed test runs.
//!
//! Reads a JUnit report through `triage`, then files one Jira issue per
//! failing test group with the report files attached. Tracker access goes
//! through the [`tracker::TrackerClient`] trait so the filing loop can be
//! driven without a network.

pub mod artifacts;
pub mod config;
pub mod content;
pub mod orchestrator;
pub mod preflight;
pub mod summary;
pub mod tracker;

pub use artifacts::{load_artifacts, Artifact};
pub use config::{Cli, ConfigError, TrackerArgs, TrackerConfig};
pub use content::{render_description, render_summary, RunContext};
pub use orchestrator::{create_issues_for_failures, IssueOutcome, IssueSettings};
pub use preflight::{preflight, PreflightError};
pub use summary::{report_totals_only, RunSummary};
pub use tracker::{
    CreatedIssue, IssueData, IssueTypeInfo, JiraClient, ProjectInfo, TrackerClient, TrackerError,
};
