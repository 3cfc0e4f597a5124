//! Ingestion: owns the venue adapters, runs full-sync and targeted-refresh,
//! fans adapter events into the cache and store.

pub mod events;
pub mod orchestrator;

pub use orchestrator::{IngestionOrchestrator, IngestionStats};
