//! Request metadata extraction.
//!
//! # Responsibilities
//! - Generate and propagate the `x-request-id` header
//! - Capture the request fields logged by the API channel and reported by
//!   diagnostics (method, full URL, client IP, user agent, ...)
//!
//! # Design Decisions
//! - Request ID added as early as possible so both log lines of one
//!   transaction carry the same ID
//! - Client IP is the socket peer when known; `x-forwarded-for` is only a
//!   fallback for in-process callers without connection info

use axum::extract::{ConnectInfo, FromRequestParts, OriginalUri};
use axum::http::{header, request::Parts, HeaderMap, Uri, Version};
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer assigning a UUID v4 request ID when the client did not send one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer copying the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Snapshot of the request fields shared by logging and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestMeta {
    pub request_id: Option<String>,
    pub method: String,
    pub url: String,
    pub path: String,
    pub protocol: String,
    pub ip: String,
    pub user_agent: Option<String>,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub has_authorization: bool,
}

impl RequestMeta {
    pub fn from_parts(parts: &Parts) -> Self {
        let headers = &parts.headers;
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            request_id: header_str(headers, X_REQUEST_ID),
            method: parts.method.to_string(),
            url: full_url(parts),
            path: original_uri(parts).path().to_string(),
            protocol: protocol_name(parts.version).to_string(),
            ip: client_ip(peer, headers),
            user_agent: header_str(headers, header::USER_AGENT.as_str()),
            content_type: header_str(headers, header::CONTENT_TYPE.as_str()),
            accept: header_str(headers, header::ACCEPT.as_str()),
            has_authorization: headers.contains_key(header::AUTHORIZATION),
        }
    }
}

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// URI as the client sent it. Nested routers strip their prefix from
/// `parts.uri`, so the one recorded by the outer router wins.
pub fn original_uri(parts: &Parts) -> &Uri {
    parts
        .extensions
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri)
        .unwrap_or(&parts.uri)
}

/// Reconstruct the absolute URL the client requested.
pub fn full_url(parts: &Parts) -> String {
    let uri = original_uri(parts);
    if uri.scheme().is_some() {
        return uri.to_string();
    }

    let scheme = parts
        .headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    format!("{}://{}{}", scheme, host, path_and_query)
}

fn client_ip(peer: Option<SocketAddr>, headers: &HeaderMap) -> String {
    if let Some(addr) = peer {
        return addr.ip().to_string();
    }
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn protocol_name(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "Unknown",
    }
}
