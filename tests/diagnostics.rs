//! `/api/diagnostics` against a live server.

use api_monitor::diagnostics::SqliteRecordStore;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;

mod common;

async fn fetch(server: &common::TestServer) -> Value {
    let res = reqwest::Client::new()
        .get(server.url("/api/diagnostics"))
        .header("Authorization", "Bearer abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    res.json().await.unwrap()
}

#[tokio::test]
async fn database_failure_does_not_stop_other_probes() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(dir.path());
    let store = SqliteRecordStore::connect_lazy(&config.database).unwrap();
    let server = common::start_server(config, Arc::new(store)).await;

    let body = fetch(&server).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "API diagnostics completed successfully");

    let diagnostics = &body["diagnostics"];
    let db = &diagnostics["database_check"];
    assert_eq!(db["connection_successful"], false);
    assert!(db["connection_error"].is_string());
    assert_eq!(db["table_access"], false);
    assert_eq!(db["table_error"], "Database connection failed");
    assert!(db["user_count"].is_null());
    assert_eq!(db["config"]["driver"], "sqlite");

    assert_eq!(diagnostics["storage_check"]["public_disk_writable"], true);
    assert_eq!(diagnostics["storage_check"]["symbolic_link_exists"], false);
    assert_eq!(diagnostics["environment"]["logging_channel"], "api");
    assert_eq!(diagnostics["request_info"]["authorization"], "Present");
    assert_eq!(diagnostics["request_info"]["ip"], "127.0.0.1");
    assert_eq!(diagnostics["request_info"]["path"], "/api/diagnostics");
    assert!(diagnostics["request_info"]["url"]
        .as_str()
        .unwrap()
        .ends_with("/api/diagnostics"));
    assert!(diagnostics["server_info"]["pid"].is_u64());
}

#[tokio::test]
async fn healthy_database_reports_user_count() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::test_config(dir.path());
    config.database.url = format!("sqlite:{}?mode=rwc", dir.path().join("app.sqlite").display());

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&config.database.url)
        .await
        .unwrap();
    sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO users (email) VALUES ('a@example.com'), ('b@example.com'), ('c@example.com')")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let store = SqliteRecordStore::connect_lazy(&config.database).unwrap();
    let server = common::start_server(config, Arc::new(store)).await;

    let db = fetch(&server).await["diagnostics"]["database_check"].clone();
    assert_eq!(db["connection_successful"], true);
    assert_eq!(db["table_access"], true);
    assert_eq!(db["user_count"], 3);
    assert!(db["table_error"].is_null());
}

#[tokio::test]
async fn reloaded_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(dir.path());
    let mut reloaded = config.clone();
    reloaded.app.env = "staging".to_string();
    reloaded.app.debug = true;

    let server = common::start_server(config, Arc::new(common::UnreachableStore)).await;
    assert_eq!(fetch(&server).await["diagnostics"]["environment"]["app_env"], "production");

    server.updates.send(reloaded).unwrap();
    for _ in 0..50 {
        if server.config.load().app.env == "staging" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let environment = fetch(&server).await["diagnostics"]["environment"].clone();
    assert_eq!(environment["app_env"], "staging");
    assert_eq!(environment["app_debug"], true);
}
