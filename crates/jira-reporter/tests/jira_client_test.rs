//! Integration tests for JiraClient.
//!
//! Uses wiremock for HTTP mocking. Tests cover the connectivity check,
//! issue-type discovery, issue creation, attachments, status mapping, and a
//! full report-to-issue pass over HTTP.

use std::time::Duration;

use chrono::{Local, TimeZone};
use jira_reporter::{
    create_issues_for_failures, preflight, Artifact, IssueData, IssueOutcome, IssueSettings,
    JiraClient, PreflightError, RunContext, TrackerClient, TrackerError,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// `qa@acme.test:secret`, Base64 encoded.
const BASIC_AUTH: &str = "Basic cWFAYWNtZS50ZXN0OnNlY3JldA==";

fn create_test_client(mock_server: &MockServer) -> JiraClient {
    JiraClient::new(
        &mock_server.uri(),
        "qa@acme.test",
        "secret",
        Duration::from_secs(5),
    )
    .expect("failed to create client")
}

fn issue() -> IssueData {
    IssueData {
        project_key: "QA".into(),
        summary: "[Automated] Group1 - 1 test(s) failed".into(),
        description: "*Test Group Failed: Group1*".into(),
        issue_type: "Bug".into(),
        labels: vec!["automated-test".into(), "newman".into()],
    }
}

#[tokio::test]
async fn test_check_connectivity_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/project/QA"))
        .and(header("authorization", BASIC_AUTH))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "10000",
            "key": "QA",
            "name": "Quality",
            "projectTypeKey": "software"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let project = client.check_connectivity("QA").await.expect("connect failed");

    assert_eq!(project.id, "10000");
    assert_eq!(project.key, "QA");
    assert_eq!(project.name, "Quality");
}

#[tokio::test]
async fn test_check_connectivity_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/project/QA"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.check_connectivity("QA").await.unwrap_err();

    match err {
        TrackerError::Connection { status, message } => {
            assert_eq!(status, Some(401));
            assert_eq!(message, "Unauthorized");
        }
        other => panic!("expected Connection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_check_connectivity_unknown_project() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/project/XX"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errorMessages": ["No project could be found with key 'XX'."],
            "errors": {}
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.check_connectivity("XX").await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Tracker connection failed (HTTP 404): No project could be found with key 'XX'."
    );
}

#[tokio::test]
async fn test_list_issue_types_with_required_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/createmeta/QA/issuetypes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issueTypes": [
                {
                    "id": "1",
                    "name": "Bug",
                    "fields": {
                        "summary": { "required": true, "name": "Summary" },
                        "issuetype": { "required": true, "name": "Issue Type" },
                        "labels": { "required": false, "name": "Labels" }
                    }
                },
                { "id": "2", "name": "Task" }
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let types = client.list_issue_types("QA").await.expect("lookup failed");

    assert_eq!(types.len(), 2);
    assert_eq!(types[0].name, "Bug");
    assert_eq!(types[0].required_fields, vec!["issuetype", "summary"]);
    assert_eq!(types[1].name, "Task");
    assert!(types[1].required_fields.is_empty());
}

#[tokio::test]
async fn test_list_issue_types_paged_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/createmeta/QA/issuetypes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "startAt": 0,
            "maxResults": 50,
            "total": 1,
            "values": [{ "id": "1", "name": "Bug" }]
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let types = client.list_issue_types("QA").await.expect("lookup failed");

    let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Bug"]);
}

#[tokio::test]
async fn test_create_issue_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue"))
        .and(header("authorization", BASIC_AUTH))
        .and(body_partial_json(json!({
            "fields": {
                "project": { "key": "QA" },
                "summary": "[Automated] Group1 - 1 test(s) failed",
                "issuetype": { "name": "Bug" },
                "labels": ["automated-test", "newman"]
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "10001",
            "key": "QA-1",
            "self": "https://acme.atlassian.net/rest/api/2/issue/10001"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let created = client.create_issue(&issue()).await.expect("create failed");

    assert_eq!(created.key, "QA-1");
    assert_eq!(created.id, "10001");
}

#[tokio::test]
async fn test_create_issue_rejected_keeps_payload() {
    let mock_server = MockServer::start().await;

    let rejection = json!({
        "errorMessages": [],
        "errors": { "labels": "Field 'labels' cannot be set." }
    });
    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue"))
        .respond_with(ResponseTemplate::new(400).set_body_json(rejection.clone()))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.create_issue(&issue()).await.unwrap_err();

    match err {
        TrackerError::IssueCreation { status, payload } => {
            assert_eq!(status, Some(400));
            assert_eq!(payload, rejection);
        }
        other => panic!("expected IssueCreation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_attach_file_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/QA-1/attachments"))
        .and(header("x-atlassian-token", "no-check"))
        .and(header("authorization", BASIC_AUTH))
        .and(body_string_contains("filename=\"report.xml\""))
        .and(body_string_contains("<testsuites/>"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "20000", "filename": "report.xml" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    client
        .attach_file("QA-1", "report.xml", b"<testsuites/>")
        .await
        .expect("attach failed");
}

#[tokio::test]
async fn test_attach_file_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/QA-1/attachments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("storage offline"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client
        .attach_file("QA-1", "report.html", b"<html></html>")
        .await
        .unwrap_err();

    match err {
        TrackerError::Attachment { filename, message } => {
            assert_eq!(filename, "report.html");
            assert_eq!(message, "HTTP 500: storage offline");
        }
        other => panic!("expected Attachment, got {other:?}"),
    }
}

#[tokio::test]
async fn test_preflight_rejects_missing_issue_type_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/project/QA"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "10000", "key": "QA", "name": "Quality" })),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/createmeta/QA/issuetypes"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "issueTypes": [{ "name": "Task" }] })),
        )
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = preflight(&client, "QA", "Bug").await.unwrap_err();

    assert!(matches!(err, PreflightError::UnknownIssueType { .. }));
    assert_eq!(
        err.to_string(),
        "Issue type \"Bug\" not found in project QA; available: Task"
    );
}

#[tokio::test]
async fn test_report_files_one_issue_with_attachments() {
    let mock_server = MockServer::start().await;

    let report = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites name="notes-api" tests="5" time="3.2">
  <testsuite name="Group1" tests="3" failures="1" errors="0" time="0.812">
    <testcase name="loginWithBadPassword" time="0.2">
      <failure type="AssertionFailure" message="expected 401 got 200">expected 401 got 200</failure>
    </testcase>
    <testcase name="loginOk" time="0.3"/>
    <testcase name="logout" time="0.3"/>
  </testsuite>
  <testsuite name="Group2" tests="2" failures="0" errors="0" time="1.1">
    <testcase name="listNotes" time="0.5"/>
    <testcase name="createNote" time="0.6"/>
  </testsuite>
</testsuites>"#;
    let aggregation = triage::aggregate(&triage::parse_str(report).expect("parse failed"))
        .expect("aggregate failed");
    assert_eq!(aggregation.failed_groups.len(), 1);

    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue"))
        .and(body_string_contains("1. *loginWithBadPassword*"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "id": "10042", "key": "QA-42" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/QA-42/attachments"))
        .and(header("x-atlassian-token", "no-check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let settings = IssueSettings {
        project_key: "QA".into(),
        issue_type: "Bug".into(),
        labels: vec!["automated-test".into()],
    };
    let ctx = RunContext {
        generated_at: Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
        target_system: None,
    };
    let artifacts = vec![
        Artifact::new("report.xml", report),
        Artifact::new("report.html", "<html></html>"),
    ];

    let outcomes = create_issues_for_failures(
        &client,
        &settings,
        &aggregation.totals,
        &aggregation.failed_groups,
        &artifacts,
        &ctx,
    )
    .await;

    assert_eq!(
        outcomes,
        vec![IssueOutcome::Success {
            group_name: "Group1".into(),
            issue_key: "QA-42".into(),
            issue_id: "10042".into(),
            issue_url: format!("{}/browse/QA-42", mock_server.uri()),
        }]
    );
}
