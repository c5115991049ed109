//! Body classification, bounded buffering and field decoding.

use axum::body::{Body, Bytes, HttpBody};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{FromRequest, Multipart};
use axum::http::header::{InvalidHeaderValue, CONTENT_TYPE};
use axum::http::{HeaderValue, Request};
use futures_util::stream::{self, Stream, StreamExt};
use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

/// Coarse classification of a `Content-Type` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Other,
}

/// JSON-like when the header contains `application/json` or `text/json`.
pub fn classify_content_type(content_type: Option<&str>) -> ContentKind {
    match content_type {
        Some(ct) if ct.contains("application/json") || ct.contains("text/json") => ContentKind::Json,
        _ => ContentKind::Other,
    }
}

fn is_form(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.contains("application/x-www-form-urlencoded"))
}

fn is_multipart(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.contains("multipart/form-data"))
}

/// Whether a request body with this content type carries decodable fields.
pub fn has_decodable_fields(content_type: Option<&str>) -> bool {
    classify_content_type(content_type) == ContentKind::Json
        || is_form(content_type)
        || is_multipart(content_type)
}

#[derive(Debug, Error)]
pub enum FieldsError {
    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON body is not an object")]
    NotAnObject,

    #[error("invalid content type: {0}")]
    ContentType(#[from] InvalidHeaderValue),

    #[error("multipart body rejected: {0}")]
    MultipartRejected(#[from] MultipartRejection),

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
}

/// Why [`buffer_bounded`] stopped before the end of a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unbuffered {
    TooLarge { limit: usize },
    ReadFailed(String),
}

impl fmt::Display for Unbuffered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unbuffered::TooLarge { limit } => write!(f, "too large (over {limit} bytes)"),
            Unbuffered::ReadFailed(e) => write!(f, "unreadable: {e}"),
        }
    }
}

/// Outcome of [`buffer_bounded`].
pub enum Buffered {
    Complete(Bytes),
    /// `body` yields every byte of the original body, including the
    /// chunks read before buffering stopped.
    Passthrough { body: Body, reason: Unbuffered },
}

/// Read `body` into memory unless it exceeds `limit` bytes.
///
/// Oversized or failing bodies are never lost: the caller gets back a body
/// that replays what was read followed by the unread remainder (or the
/// read error).
pub async fn buffer_bounded(body: Body, limit: usize) -> Buffered {
    let too_large = Unbuffered::TooLarge { limit };
    if body.size_hint().lower() > limit as u64 {
        return Buffered::Passthrough { body, reason: too_large };
    }

    let mut rest = body.into_data_stream();
    let mut chunks: Vec<Bytes> = Vec::new();
    let mut read = 0usize;
    while let Some(frame) = rest.next().await {
        match frame {
            Ok(chunk) => {
                read = read.saturating_add(chunk.len());
                chunks.push(chunk);
                if read > limit {
                    return Buffered::Passthrough {
                        body: replay(chunks, rest),
                        reason: too_large,
                    };
                }
            }
            Err(e) => {
                let reason = Unbuffered::ReadFailed(e.to_string());
                return Buffered::Passthrough {
                    body: replay(chunks, stream::once(async move { Err::<Bytes, _>(e) })),
                    reason,
                };
            }
        }
    }

    match chunks.len() {
        0 => Buffered::Complete(Bytes::new()),
        1 => Buffered::Complete(chunks.swap_remove(0)),
        _ => Buffered::Complete(Bytes::from(chunks.concat())),
    }
}

fn replay<S>(chunks: Vec<Bytes>, rest: S) -> Body
where
    S: Stream<Item = Result<Bytes, axum::Error>> + Send + 'static,
{
    Body::from_stream(stream::iter(chunks.into_iter().map(Ok::<_, axum::Error>)).chain(rest))
}

/// Decode the top-level input fields of a request, multipart included.
///
/// Query parameters come first and body fields override them.
pub async fn read_fields(
    query: Option<&str>,
    content_type: Option<&str>,
    body: Bytes,
) -> Result<Map<String, Value>, FieldsError> {
    match content_type {
        Some(ct) if is_multipart(content_type) && !body.is_empty() => {
            let mut fields = decode_fields(query, None, &[])?;
            fields.extend(decode_multipart(ct, body).await?);
            Ok(fields)
        }
        _ => decode_fields(query, content_type, &body),
    }
}

/// Decode the top-level input fields of a request.
///
/// Query parameters come first and body fields override them. Bodies that
/// are neither JSON nor urlencoded contribute no fields; multipart bodies
/// go through [`read_fields`].
pub fn decode_fields(
    query: Option<&str>,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Map<String, Value>, FieldsError> {
    let mut fields = Map::new();
    if let Some(query) = query {
        extend_form(&mut fields, query.as_bytes());
    }

    if body.is_empty() {
        return Ok(fields);
    }

    if classify_content_type(content_type) == ContentKind::Json {
        match serde_json::from_slice::<Value>(body)? {
            Value::Object(map) => fields.extend(map),
            _ => return Err(FieldsError::NotAnObject),
        }
    } else if is_form(content_type) {
        extend_form(&mut fields, body);
    }

    Ok(fields)
}

/// Text parts become strings. File parts are summarized by
/// [`uploaded_file`] so their contents never reach the log.
pub async fn decode_multipart(content_type: &str, body: Bytes) -> Result<Map<String, Value>, FieldsError> {
    let mut request = Request::new(Body::from(body));
    request
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_str(content_type)?);
    let mut multipart = Multipart::from_request(request, &()).await?;

    let mut fields = Map::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let size = field.bytes().await?.len();
                uploaded_file(&file_name, size)
            }
            None => Value::String(field.text().await?),
        };
        fields.insert(name, value);
    }
    Ok(fields)
}

/// Stand-in for an uploaded file part.
pub fn uploaded_file(file_name: &str, size: usize) -> Value {
    json!({ "uploaded_file": file_name, "size": size })
}

pub fn is_uploaded_file(value: &Value) -> bool {
    value.get("uploaded_file").is_some_and(Value::is_string)
}

fn extend_form(fields: &mut Map<String, Value>, encoded: &[u8]) {
    for (key, value) in url::form_urlencoded::parse(encoded) {
        fields.insert(key.into_owned(), Value::String(value.into_owned()));
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub(crate) const BOUNDARY: &str = "api-monitor-boundary";

    pub(crate) fn multipart_body() -> String {
        [
            "--api-monitor-boundary",
            "Content-Disposition: form-data; name=\"name\"",
            "",
            "Ana",
            "--api-monitor-boundary",
            "Content-Disposition: form-data; name=\"password\"",
            "",
            "hunter2",
            "--api-monitor-boundary",
            "Content-Disposition: form-data; name=\"business_registration_document\"; filename=\"reg.pdf\"",
            "Content-Type: application/pdf",
            "",
            "%PDF-1.4 fake",
            "--api-monitor-boundary--",
            "",
        ]
        .join("\r\n")
    }
}
