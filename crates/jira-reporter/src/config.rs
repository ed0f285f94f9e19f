//! Reporter configuration
//!
//! Command line flags, each tracker setting bound to an environment variable,
//! validated once into an immutable [`TrackerConfig`].

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser};
use thiserror::Error;

use crate::orchestrator::{IssueSettings, DEFAULT_LABELS};

/// Issue type used when none is configured.
pub const DEFAULT_ISSUE_TYPE: &str = "Bug";

/// Command line for the reporter binary.
#[derive(Debug, Parser)]
#[command(
    name = "jira-reporter",
    version,
    about = "File one Jira issue per failing test group in a JUnit report"
)]
pub struct Cli {
    /// JUnit XML report produced by the test run
    #[arg(long, default_value = "results/report.xml")]
    pub report: PathBuf,

    /// Human-readable report attached alongside the XML (skipped if absent)
    #[arg(long, default_value = "results/report.html")]
    pub html_report: PathBuf,

    /// Write the run summary as JSON to this path
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    #[command(flatten)]
    pub tracker: TrackerArgs,
}

/// Tracker settings, each overridable from the environment.
#[derive(Debug, Clone, Default, Args)]
pub struct TrackerArgs {
    /// Jira site, e.g. https://example.atlassian.net
    #[arg(long, env = "JIRA_BASE_URL")]
    pub base_url: Option<String>,

    /// Account email used for Basic auth
    #[arg(long, env = "JIRA_EMAIL")]
    pub email: Option<String>,

    /// API token paired with the account email
    #[arg(long, env = "JIRA_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Key of the project receiving the issues
    #[arg(long, env = "JIRA_PROJECT_KEY")]
    pub project_key: Option<String>,

    /// Issue type name; must exist in the project
    #[arg(long, env = "JIRA_ISSUE_TYPE")]
    pub issue_type: Option<String>,

    /// Labels applied to every issue (comma separated in the environment)
    #[arg(long = "label", env = "JIRA_LABELS", value_delimiter = ',')]
    pub labels: Vec<String>,

    /// System under test, shown in each issue footer
    #[arg(long, env = "REPORT_TARGET_SYSTEM")]
    pub target_system: Option<String>,

    /// Per-request timeout for tracker calls
    #[arg(long, env = "JIRA_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

/// Configuration problems. Missing settings disable the integration
/// rather than failing the run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing tracker configuration: {}", .keys.join(", "))]
    Missing { keys: Vec<&'static str> },
}

/// Validated, immutable tracker configuration.
#[derive(Clone)]
pub struct TrackerConfig {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    pub project_key: String,
    pub issue_type: String,
    pub labels: Vec<String>,
    pub target_system: Option<String>,
    pub timeout: Duration,
}

impl TrackerConfig {
    /// Validate raw arguments. Blank values count as missing.
    pub fn from_args(args: &TrackerArgs) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut require = |value: &Option<String>, key: &'static str| -> String {
            match non_blank(value) {
                Some(v) => v,
                None => {
                    missing.push(key);
                    String::new()
                }
            }
        };

        let base_url = require(&args.base_url, "JIRA_BASE_URL");
        let email = require(&args.email, "JIRA_EMAIL");
        let api_token = require(&args.api_token, "JIRA_API_TOKEN");
        let project_key = require(&args.project_key, "JIRA_PROJECT_KEY");

        if !missing.is_empty() {
            return Err(ConfigError::Missing { keys: missing });
        }

        let labels: Vec<String> = args
            .labels
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            email,
            api_token,
            project_key,
            issue_type: non_blank(&args.issue_type)
                .unwrap_or_else(|| DEFAULT_ISSUE_TYPE.to_string()),
            labels: if labels.is_empty() {
                DEFAULT_LABELS.iter().map(|l| l.to_string()).collect()
            } else {
                labels
            },
            target_system: non_blank(&args.target_system),
            timeout: Duration::from_secs(args.timeout_secs.max(1)),
        })
    }

    /// Settings the orchestrator needs for every issue.
    pub fn issue_settings(&self) -> IssueSettings {
        IssueSettings {
            project_key: self.project_key.clone(),
            issue_type: self.issue_type.clone(),
            labels: self.labels.clone(),
        }
    }
}

impl fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .field("project_key", &self.project_key)
            .field("issue_type", &self.issue_type)
            .field("labels", &self.labels)
            .field("target_system", &self.target_system)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
