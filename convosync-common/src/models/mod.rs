// File: convosync-common/src/models/mod.rs
pub mod transcript;
pub mod session;
pub mod event;

pub use transcript::{DialogueTurn, RawTranscript, Transcript, TurnRole};
pub use session::{LocationType, Session, SessionState, UserCategory};
pub use event::{EventType, SessionEvent};
