//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Operational events (startup, probes, failures):
//!     → logging.rs (tracing subscriber, stdout)
//!
//! API traffic (RequestLogger middleware):
//!     → channel.rs (dated files, one line per entry)
//!     → read back later by the analyzer
//!
//! Counters and latencies:
//!     → metrics.rs (Prometheus exporter, optional)
//! ```
//!
//! # Design Decisions
//! - The API channel is an explicit handle, separate from tracing output
//! - Channel write failures are counted, never surfaced to clients

pub mod channel;
pub mod logging;
pub mod metrics;

pub use channel::{ApiLogChannel, ChannelError, LogFilePattern, LogLevel};
