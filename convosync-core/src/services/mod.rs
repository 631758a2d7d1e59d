// File: convosync-core/src/services/mod.rs

pub mod reconstruction;
pub mod event_inference;
pub mod ingest_service;
pub mod sync_service;

pub use ingest_service::{IngestionResult, TranscriptIngestService, TranscriptIngestor};
pub use sync_service::{SyncConfig, SyncOptions, SyncSummary, TranscriptSyncService};
