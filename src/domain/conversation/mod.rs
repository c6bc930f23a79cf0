//! Conversation domain module.
//!
//! Turns exchanged between the user and the assistant. Turns are immutable
//! once persisted; the store only ever appends.

mod turn;

pub use turn::{ConversationTurn, TurnRole};
