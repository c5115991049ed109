//! API request/response logger.
//!
//! Every transaction produces exactly two channel entries, `API Request`
//! before the handler runs and `API Response` after it, plus an
//! `API Exception` entry when the handler rendered an [`ApiError`].
//! Channel failures are counted and swallowed; the response the client
//! receives is the one the handler produced. Bodies over the buffering
//! limit are forwarded unchanged and logged without their fields.
//!
//! [`ApiError`]: crate::http::error::ApiError

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::http::body::{
    buffer_bounded, classify_content_type, decode_fields, has_decodable_fields, read_fields, Buffered,
    ContentKind,
};
use crate::http::error::ReportedError;
use crate::http::middleware::redaction::{redact_fields, redact_headers};
use crate::http::request::RequestMeta;
use crate::observability::{metrics, ApiLogChannel, LogLevel};

/// State for the API logger middleware.
#[derive(Clone)]
pub struct ApiLoggerState {
    pub channel: Arc<ApiLogChannel>,
    /// Largest request or response body buffered for logging. Larger
    /// bodies reach their destination untouched and are only summarized.
    pub max_body_size: usize,
}

impl ApiLoggerState {
    pub fn new(channel: Arc<ApiLogChannel>, max_body_size: usize) -> Self {
        Self {
            channel,
            max_body_size,
        }
    }

    fn log(&self, level: LogLevel, message: &str, context: &Value) {
        if let Err(e) = self.channel.write(level, message, context) {
            metrics::record_log_write_failure();
            tracing::warn!(error = %e, entry = message, "API log write failed");
        }
    }
}

pub async fn api_logger_middleware(
    State(state): State<ApiLoggerState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let mut meta = RequestMeta::from_parts(&parts);
    // Both entries of a transaction carry the same ID.
    meta.request_id.get_or_insert_with(|| Uuid::new_v4().to_string());
    let headers = redact_headers(&parts.headers);
    let query = parts.uri.query();

    let mut skipped = None;
    let (fields, body) = if has_decodable_fields(meta.content_type.as_deref()) {
        match buffer_bounded(body, state.max_body_size).await {
            Buffered::Complete(bytes) => (request_fields(&meta, query, bytes.clone()).await, Body::from(bytes)),
            Buffered::Passthrough { body, reason } => {
                skipped = Some(reason.to_string());
                (request_fields(&meta, query, Bytes::new()).await, body)
            }
        }
    } else {
        (request_fields(&meta, query, Bytes::new()).await, body)
    };

    let mut context = json!({
        "request_id": meta.request_id,
        "method": meta.method,
        "uri": meta.url,
        "ip": meta.ip,
        "user_agent": meta.user_agent,
        "headers": headers,
        "body": fields,
    });
    if let Some(reason) = skipped {
        context["body_not_logged"] = json!(reason);
    }
    state.log(LogLevel::Info, "API Request", &context);

    let response = next.run(Request::from_parts(parts, body)).await;
    log_response(&state, &meta, response, start).await
}

async fn request_fields(meta: &RequestMeta, query: Option<&str>, body: Bytes) -> Map<String, Value> {
    match read_fields(query, meta.content_type.as_deref(), body).await {
        Ok(fields) => redact_fields(fields),
        Err(e) => {
            tracing::debug!(error = %e, path = %meta.path, "Request body fields not decodable");
            // Query parameters are still worth logging.
            decode_fields(query, None, &[]).map(redact_fields).unwrap_or_default()
        }
    }
}

async fn log_response(
    state: &ApiLoggerState,
    meta: &RequestMeta,
    response: Response,
    start: Instant,
) -> Response {
    let status = response.status();

    if let Some(reported) = response.extensions().get::<ReportedError>() {
        state.log(
            LogLevel::Error,
            "API Exception",
            &json!({
                "message": reported.message,
                "kind": reported.kind,
                "code": reported.status,
                "method": meta.method,
                "url": meta.url,
                "ip": meta.ip,
                "user_agent": meta.user_agent,
            }),
        );
    }

    let (parts, body) = response.into_parts();
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let (summary, body) = match classify_content_type(content_type) {
        ContentKind::Other => (non_json_summary(&parts.headers, &body), body),
        ContentKind::Json => match buffer_bounded(body, state.max_body_size).await {
            Buffered::Complete(bytes) => (summarize_json(status, &bytes), Body::from(bytes)),
            Buffered::Passthrough { body, reason } => {
                let mut summary = non_json_summary(&parts.headers, &body);
                summary["not_parsed"] = json!(reason.to_string());
                (summary, body)
            }
        },
    };

    let duration_ms = round_to(start.elapsed().as_secs_f64() * 1000.0, 2);
    state.log(
        LogLevel::Info,
        "API Response",
        &json!({
            "request_id": meta.request_id,
            "method": meta.method,
            "uri": meta.url,
            "status": status.as_u16(),
            "duration_ms": duration_ms,
            "response": summary,
        }),
    );
    metrics::record_request(&meta.method, status.as_u16(), start);

    Response::from_parts(parts, body)
}

fn non_json_summary(headers: &HeaderMap, body: &Body) -> Value {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let size = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .map(|v| json!(v))
        .or_else(|| body.size_hint().exact().map(|n| json!(n.to_string())))
        .unwrap_or_else(|| json!("unknown"));

    json!({
        "content_type": content_type,
        "size": size,
    })
}

/// Summarize a JSON response body.
///
/// Error responses (status >= 400) are logged in full; successful ones only
/// as `{status, message, has_data, has_errors}`.
pub fn summarize_json(status: StatusCode, body: &Bytes) -> Value {
    let data: Value = match serde_json::from_slice(body) {
        Ok(data) => data,
        Err(e) => return json!({ "error": format!("Could not parse response JSON: {e}") }),
    };

    if status.as_u16() >= 400 {
        return data;
    }

    let present = |key: &str| data.get(key).is_some_and(|v| !v.is_null());
    json!({
        "status": data.get("status").cloned().unwrap_or(Value::Null),
        "message": data.get("message").cloned().unwrap_or(Value::Null),
        "has_data": present("data"),
        "has_errors": present("errors"),
    })
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
