//! Request middleware.
//!
//! ```text
//! request → api_logger (redact, write "API Request")
//!         → handler
//!         → api_logger (summarize, write "API Response")
//! ```

pub mod api_logger;
pub mod redaction;

pub use api_logger::{api_logger_middleware, ApiLoggerState};
pub use redaction::{redact_fields, redact_headers, REDACTED};
