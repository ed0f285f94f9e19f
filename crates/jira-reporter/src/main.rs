use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use jira_reporter::{
    create_issues_for_failures, load_artifacts, preflight, report_totals_only, Cli, ConfigError,
    JiraClient, RunContext, RunSummary, TrackerConfig,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    info!(report = %cli.report.display(), "Checking test results for Jira integration");

    let config = match TrackerConfig::from_args(&cli.tracker) {
        Ok(config) => config,
        Err(ConfigError::Missing { keys }) => {
            warn!(
                missing = %keys.join(", "),
                "Jira integration disabled: set these variables to enable it"
            );
            report_totals_only(&cli.report, cli.summary_json.as_deref());
            return Ok(ExitCode::SUCCESS);
        }
    };
    info!(?config, "Jira integration enabled");

    let tracker = JiraClient::from_config(&config).context("Failed to build Jira client")?;
    preflight(&tracker, &config.project_key, &config.issue_type)
        .await
        .context("Jira preflight failed")?;

    let aggregation = triage::load_report(&cli.report).context("Failed to load test report")?;
    RunSummary::log_totals(&aggregation.totals);

    if !aggregation.totals.has_failures() {
        info!("All tests passed, no Jira issue needed");
        let summary = RunSummary::new(aggregation.totals, Vec::new());
        if let Some(path) = &cli.summary_json {
            summary.write_json(path)?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    warn!(
        groups = aggregation.failed_groups.len(),
        "Test failures detected, creating Jira issues"
    );

    let artifacts = load_artifacts(&[cli.report.clone(), cli.html_report.clone()]);
    let ctx = RunContext::now(config.target_system.clone());
    let outcomes = create_issues_for_failures(
        &tracker,
        &config.issue_settings(),
        &aggregation.totals,
        &aggregation.failed_groups,
        &artifacts,
        &ctx,
    )
    .await;

    let summary = RunSummary::new(aggregation.totals, outcomes);
    summary.log();
    if let Some(path) = &cli.summary_json {
        summary.write_json(path)?;
    }

    Ok(summary.exit_code())
}
