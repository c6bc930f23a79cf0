//! Foundation module - Shared domain primitives.
//!
//! Contains the chapter vocabulary, identifiers and timestamps that form
//! the shared language of the dialogue core.

mod chapter;
mod ids;
mod timestamp;

pub use chapter::{Chapter, ChapterError};
pub use ids::{SessionId, TurnId};
pub use timestamp::Timestamp;
