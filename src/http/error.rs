//! API error rendering.
//!
//! Handlers return [`ApiError`] with the failure point that produced it.
//! Rendering attaches a [`ReportedError`] to the response so the API
//! logger can write an `API Exception` line on the same channel as the
//! request/response pair.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::any::Any;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    // The next three belong to the registration flow of the application
    // mounting this router; handlers here never raise them.
    #[error("storage failure: {0}")]
    Storage(String),

    #[error("record creation failed: {0}")]
    RecordCreation(String),

    #[error("token issuance failed: {0}")]
    TokenIssuance(String),

    /// A handler panicked. See [`panic_response`].
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Stable kind name written to logs and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Storage(_) => "storage",
            ApiError::RecordCreation(_) => "record_creation",
            ApiError::TokenIssuance(_) => "token_issuance",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Marker left in response extensions for the API logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    pub kind: &'static str,
    pub message: String,
    pub status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let reported = ReportedError {
            kind: self.kind(),
            message: message.clone(),
            status: status.as_u16(),
        };

        let body = Json(json!({
            "success": false,
            "message": if message.is_empty() { "Server Error".to_string() } else { message },
            "exception": reported.kind,
        }));

        let mut response = (status, body).into_response();
        response.extensions_mut().insert(reported);
        response
    }
}

/// Response for a panicking handler, for `CatchPanicLayer::custom`.
///
/// The panic payload goes to tracing only; clients see a generic message.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    tracing::error!(panic = %detail, "Handler panicked");

    ApiError::Internal("Server Error".into()).into_response()
}
