// src/repositories/mod.rs

pub mod postgres;

pub use postgres::{
    DialogueTurnRepo, PostgresDialogueTurnRepository, PostgresSessionEventRepository,
    PostgresSessionRepository, PostgresTranscriptRepository, SessionEventRepo, SessionRepo,
    TranscriptRepo,
};
