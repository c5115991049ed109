//! `/api` handlers.

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::diagnostics::DiagnosticsReport;
use crate::http::body::{is_uploaded_file, read_fields};
use crate::http::error::ApiError;
use crate::http::middleware::redaction::{is_sensitive, SENSITIVE_FIELDS};
use crate::http::request::RequestMeta;
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct DiagnosticsResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub diagnostics: DiagnosticsReport,
}

/// `GET /api/diagnostics`. Always 200; probe failures are inside the report.
pub async fn diagnostics(
    State(state): State<AppState>,
    meta: RequestMeta,
) -> Json<DiagnosticsResponse> {
    tracing::info!(ip = %meta.ip, user_agent = ?meta.user_agent, "API diagnostics started");

    let report = state.probe.run(&meta).await;

    tracing::info!(
        database_ok = report
            .database_check
            .completed()
            .is_some_and(|db| db.connection_successful),
        storage_ok = report
            .storage_check
            .completed()
            .is_some_and(|s| s.public_disk_writable),
        "API diagnostics completed"
    );

    Json(DiagnosticsResponse {
        status: "success",
        message: "API diagnostics completed successfully",
        diagnostics: report,
    })
}

#[derive(Serialize)]
pub struct DebugInfo {
    pub status: &'static str,
    pub message: &'static str,
    pub server_time: String,
    pub environment: String,
    pub version: &'static str,
}

/// `GET /api/debug`
pub async fn debug(State(state): State<AppState>) -> Json<DebugInfo> {
    let config = state.config.load();
    Json(DebugInfo {
        status: "success",
        message: "API is working correctly",
        server_time: Utc::now().to_rfc3339(),
        environment: config.app.env.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /api/register-test`
///
/// Echoes the shape of a registration payload without creating anything.
pub async fn register_test(
    meta: RequestMeta,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let fields = read_fields(query.as_deref(), meta.content_type.as_deref(), body)
        .await
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let logged: Map<String, Value> = fields
        .iter()
        .filter(|(key, _)| !is_sensitive(key, SENSITIVE_FIELDS))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let request_data = Value::Object(logged);
    tracing::info!(ip = %meta.ip, request_data = %request_data, "Registration test endpoint hit");

    let text = |key: &str| match fields.get(key) {
        Some(Value::String(s)) => json!(s),
        Some(Value::Null) | None => json!("Not provided"),
        Some(other) => other.clone(),
    };
    let yes_no = |present: bool| if present { "Yes" } else { "No" };
    let has = |key: &str| yes_no(fields.contains_key(key));
    let has_file = |key: &str| yes_no(fields.get(key).is_some_and(is_uploaded_file));

    Ok(Json(json!({
        "status": "success",
        "message": "Registration test endpoint working",
        "received_data": {
            "name": text("name"),
            "email": text("email"),
            "role": text("role"),
            "has_password": has("password"),
            "has_password_confirmation": has("password_confirmation"),
            "has_business_registration_number": has("business_registration_number"),
            "has_business_registration_document": has_file("business_registration_document"),
            "content_type": meta.content_type,
            "http_method": meta.method,
        }
    })))
}
