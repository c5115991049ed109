//! On-demand system diagnostics.
//!
//! # Data Flow
//! ```text
//! GET /api/diagnostics
//!     → probes.rs (server, request, database, storage, environment)
//!         database → store.rs (RecordStore: SELECT 1, COUNT(*))
//!         storage  → blob.rs (BlobStore: put, exists, delete)
//!     → DiagnosticsReport (always 200)
//! ```

pub mod blob;
pub mod probes;
pub mod store;

pub use blob::{BlobError, BlobStore, LocalDiskStore};
pub use probes::{DiagnosticsProbe, DiagnosticsReport, ProbeFailure, ProbeOutcome};
pub use store::{RecordStore, SqliteRecordStore, StoreError};
