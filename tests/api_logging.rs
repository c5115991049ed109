//! Request logging end to end: server writes, analyzer reads back.

use api_monitor::analyzer::{AnalyzeOptions, EndpointFilter, LogAnalyzer};
use serde_json::{json, Value};
use std::sync::Arc;

mod common;

#[tokio::test]
async fn logged_pair_is_found_by_analyzer() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(dir.path());
    let logging = config.logging.clone();
    let server = common::start_server(config, Arc::new(common::UnreachableStore)).await;

    let res = reqwest::Client::new()
        .post(server.url("/api/register-test"))
        .json(&json!({
            "name": "Ana",
            "email": "ana@example.com",
            "password": "hunter2-secret",
            "password_confirmation": "hunter2-secret",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["received_data"]["has_password"], "Yes");

    let analyzer = LogAnalyzer::from_config(&logging);
    let result = analyzer.analyze(&AnalyzeOptions::default()).unwrap();
    assert_eq!(result.matched_entries.len(), 2);
    assert!(result.matched_entries[0].raw_line.contains("api.INFO: API Request"));
    assert!(result.matched_entries[1].raw_line.contains("api.INFO: API Response"));
    assert!(result.matched_entries.iter().all(|e| e.is_registration));
    assert!(result.registration_error_count <= result.registration_count);

    let contents = common::read_logs(&server.log_dir);
    assert!(!contents.contains("hunter2-secret"));
    assert!(contents.contains(r#""password":"REDACTED""#));
    assert!(contents.contains(r#""password_confirmation":"REDACTED""#));
}

#[tokio::test]
async fn sensitive_headers_are_redacted() {
    let dir = tempfile::tempdir().unwrap();
    let server = common::start_server(common::test_config(dir.path()), Arc::new(common::UnreachableStore)).await;

    let res = reqwest::Client::new()
        .get(server.url("/api/debug"))
        .header("Authorization", "Bearer tok-123456")
        .header("Cookie", "session=abcdef")
        .header("X-XSRF-TOKEN", "xsrf-987")
        .header("X-Client", "mobile")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let contents = common::read_logs(&server.log_dir);
    for secret in ["tok-123456", "session=abcdef", "xsrf-987"] {
        assert!(!contents.contains(secret), "{secret} leaked into the log");
    }
    assert!(contents.contains(r#""authorization":"REDACTED""#));
    assert!(contents.contains(r#""x-client":"mobile""#));
}

#[tokio::test]
async fn request_and_response_share_request_id() {
    let dir = tempfile::tempdir().unwrap();
    let server = common::start_server(common::test_config(dir.path()), Arc::new(common::UnreachableStore)).await;

    let res = reqwest::Client::new()
        .get(server.url("/api/debug"))
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "req-42");

    let contents = common::read_logs(&server.log_dir);
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.contains(r#""request_id":"req-42""#)));
}

#[tokio::test]
async fn validation_failure_is_logged_as_exception() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(dir.path());
    let logging = config.logging.clone();
    let server = common::start_server(config, Arc::new(common::UnreachableStore)).await;

    let res = reqwest::Client::new()
        .post(server.url("/api/register-test"))
        .header("content-type", "application/json")
        .body("[1, 2")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 422);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["exception"], "validation");

    let result = LogAnalyzer::from_config(&logging)
        .analyze(&AnalyzeOptions {
            errors_only: true,
            endpoint: EndpointFilter::from("/api/register-test"),
            ..Default::default()
        })
        .unwrap();
    assert!(result
        .matched_entries
        .iter()
        .any(|e| e.raw_line.contains("api.ERROR: API Exception")));
    assert!(result.registration_error_count >= 1);
}
