//! Offline API log analysis.
//!
//! # Data Flow
//! ```text
//! logging.directory
//!     → files.rs (discover <prefix>-YYYY-MM-DD.<ext>, newest first)
//!     → scan.rs (marker pre-filter, leading timestamp, time window)
//!     → classify.rs (error / registration keywords)
//!     → AnalysisResult (counters over the window, filtered display list)
//!     → report.rs (summary, tables, recommendations)
//! ```
//!
//! Counters are accumulated before the `errors_only` and endpoint filters
//! are applied, so they describe the whole window.

pub mod classify;
pub mod files;
pub mod report;
pub mod scan;

pub use files::{clear_logs, discover_log_files, AnalyzerError, LogFile};
pub use report::{render_report, ReportOptions};
pub use scan::{AnalysisResult, AnalyzeOptions, EndpointFilter, LogAnalyzer, MatchedEntry};
