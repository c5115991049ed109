//! API observability: request logging, log analysis and diagnostics.

pub mod analyzer;
pub mod config;
pub mod diagnostics;
pub mod http;
pub mod observability;

pub use analyzer::LogAnalyzer;
pub use config::schema::AppConfig;
pub use diagnostics::DiagnosticsProbe;
pub use http::HttpServer;
pub use observability::ApiLogChannel;
