//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace / request-id / timeout / CORS layers)
//!     → middleware/api_logger.rs (write "API Request")
//!     → handlers.rs (diagnostics, debug, register-test)
//!     → error.rs (ApiError rendering)
//!     → middleware/api_logger.rs (write "API Response")
//!     → Send to client
//! ```

pub mod body;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use request::{RequestMeta, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
