//! Jira Cloud REST implementation of [`TrackerClient`].
//!
//! Project and issue-type lookups use API v3; issue creation and uploads use
//! API v2, whose `description` accepts wiki markup instead of ADF.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{CreatedIssue, IssueData, IssueTypeInfo, ProjectInfo, TrackerClient, TrackerError};
use crate::config::TrackerConfig;

const USER_AGENT_VALUE: &str = concat!("jira-reporter/", env!("CARGO_PKG_VERSION"));

/// Jira client holding one pre-authenticated HTTP transport per run.
#[derive(Debug, Clone)]
pub struct JiraClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct IssueTypesPage {
    #[serde(rename = "issueTypes", alias = "values", default)]
    issue_types: Vec<IssueTypeMeta>,
}

#[derive(Debug, Deserialize)]
struct IssueTypeMeta {
    name: String,
    #[serde(default)]
    fields: BTreeMap<String, FieldMeta>,
}

#[derive(Debug, Deserialize)]
struct FieldMeta {
    #[serde(default)]
    required: bool,
}

impl JiraClient {
    /// Build a client. The Basic credential is encoded here once and sent
    /// with every request.
    pub fn new(
        base_url: &str,
        email: &str,
        api_token: &str,
        timeout: Duration,
    ) -> Result<Self, TrackerError> {
        let credential = STANDARD.encode(format!("{email}:{api_token}"));
        let mut auth = HeaderValue::from_str(&format!("Basic {credential}"))
            .map_err(|e| TrackerError::Client(format!("invalid credential header: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| TrackerError::Client(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &TrackerConfig) -> Result<Self, TrackerError> {
        Self::new(
            &config.base_url,
            &config.email,
            &config.api_token,
            config.timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON document, mapping every failure to a connection error.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TrackerError> {
        let url = self.url(path);
        debug!(url = %url, "Tracker GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TrackerError::Connection {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Connection {
                status: Some(status.as_u16()),
                message: error_messages(&body),
            });
        }

        response.json().await.map_err(|e| TrackerError::Connection {
            status: Some(status.as_u16()),
            message: format!("unexpected response from {path}: {e}"),
        })
    }
}

#[async_trait]
impl TrackerClient for JiraClient {
    async fn check_connectivity(&self, project_key: &str) -> Result<ProjectInfo, TrackerError> {
        self.get_json(&format!("/rest/api/3/project/{project_key}"))
            .await
    }

    async fn list_issue_types(
        &self,
        project_key: &str,
    ) -> Result<Vec<IssueTypeInfo>, TrackerError> {
        let page: IssueTypesPage = self
            .get_json(&format!(
                "/rest/api/3/issue/createmeta/{project_key}/issuetypes"
            ))
            .await?;

        Ok(page
            .issue_types
            .into_iter()
            .map(|t| IssueTypeInfo {
                name: t.name,
                required_fields: t
                    .fields
                    .into_iter()
                    .filter(|(_, meta)| meta.required)
                    .map(|(id, _)| id)
                    .collect(),
            })
            .collect())
    }

    async fn create_issue(&self, issue: &IssueData) -> Result<CreatedIssue, TrackerError> {
        let body = json!({
            "fields": {
                "project": { "key": issue.project_key },
                "summary": issue.summary,
                "description": issue.description,
                "issuetype": { "name": issue.issue_type },
                "labels": issue.labels,
            }
        });

        let response = self
            .client
            .post(self.url("/rest/api/2/issue"))
            .json(&body)
            .send()
            .await
            .map_err(|e| TrackerError::IssueCreation {
                status: None,
                payload: Value::String(e.to_string()),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(TrackerError::IssueCreation {
                status: Some(status.as_u16()),
                payload: payload_from_body(text),
            });
        }

        serde_json::from_str::<CreatedIssue>(&text).map_err(|e| TrackerError::IssueCreation {
            status: Some(status.as_u16()),
            payload: Value::String(format!("unreadable create response: {e}")),
        })
    }

    async fn attach_file(
        &self,
        issue_key: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), TrackerError> {
        let attachment_error = |message: String| TrackerError::Attachment {
            filename: filename.to_string(),
            message,
        };

        let form = Form::new().part(
            "file",
            Part::bytes(bytes.to_vec()).file_name(filename.to_string()),
        );

        let response = self
            .client
            .post(self.url(&format!("/rest/api/2/issue/{issue_key}/attachments")))
            .header("X-Atlassian-Token", "no-check")
            .multipart(form)
            .send()
            .await
            .map_err(|e| attachment_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(attachment_error(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_messages(&body)
            )));
        }
        Ok(())
    }

    fn browse_url(&self, issue_key: &str) -> String {
        format!("{}/browse/{}", self.base_url, issue_key)
    }
}

/// JSON error bodies are kept structured; anything else as a string.
fn payload_from_body(body: String) -> Value {
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

/// Flatten Jira's `{"errorMessages": [...], "errors": {...}}` into one line.
fn error_messages(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    let mut parts: Vec<String> = value["errorMessages"]
        .as_array()
        .map(|msgs| {
            msgs.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if let Some(fields) = value["errors"].as_object() {
        parts.extend(fields.iter().map(|(field, msg)| match msg.as_str() {
            Some(m) => format!("{field}: {m}"),
            None => format!("{field}: {msg}"),
        }));
    }

    if parts.is_empty() {
        value.to_string()
    } else {
        parts.join("; ")
    }
}
