//! Header and field redaction.
//!
//! Names are matched case-insensitively and exactly against fixed
//! denylists. Matching values are replaced with [`REDACTED`] before anything
//! reaches the log channel.

use axum::http::HeaderMap;
use serde_json::{Map, Value};

pub const REDACTED: &str = "REDACTED";

pub const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "x-xsrf-token"];

pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "password_confirmation",
    "token",
    "api_token",
    "credit_card",
];

pub fn is_sensitive(name: &str, denylist: &[&str]) -> bool {
    denylist.iter().any(|denied| denied.eq_ignore_ascii_case(name))
}

/// Headers as a JSON object. Repeated headers become arrays.
pub fn redact_headers(headers: &HeaderMap) -> Map<String, Value> {
    let mut out = Map::new();
    for name in headers.keys() {
        let key = name.as_str().to_string();
        if is_sensitive(&key, SENSITIVE_HEADERS) {
            out.insert(key, Value::String(REDACTED.to_string()));
            continue;
        }

        let mut values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        out.insert(key, value);
    }
    out
}

pub fn redact_fields(fields: Map<String, Value>) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| {
            if is_sensitive(&key, SENSITIVE_FIELDS) {
                (key, Value::String(REDACTED.to_string()))
            } else {
                (key, value)
            }
        })
        .collect()
}
