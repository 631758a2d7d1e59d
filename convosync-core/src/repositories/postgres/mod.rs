// src/repositories/postgres/mod.rs

pub mod transcripts;
pub mod dialogue_turns;
pub mod sessions;
pub mod session_events;

pub use transcripts::{PostgresTranscriptRepository, TranscriptRepo};
pub use dialogue_turns::{DialogueTurnRepo, PostgresDialogueTurnRepository};
pub use sessions::{PostgresSessionRepository, SessionRepo};
pub use session_events::{PostgresSessionEventRepository, SessionEventRepo};
