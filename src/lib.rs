// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod render;
pub mod snapshot;
pub mod telemetry;
pub mod tracker;

// ---- Re-exports for stable public API ----
pub use crate::config::Config;
pub use crate::error::SnapshotError;
pub use crate::ingest::types::{PageSource, RawEvent};
pub use crate::pipeline::{run_once, RunSummary};
pub use crate::snapshot::{JsonFileStore, Snapshot, SnapshotStore};
pub use crate::tracker::{enrich, Change, EnrichedEvent};
