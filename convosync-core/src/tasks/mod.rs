// File: convosync-core/src/tasks/mod.rs
pub mod transcript_sync;
