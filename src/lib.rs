//! Wizard Dialogue - Turn orchestration for a building-requirements wizard
//!
//! Decides per user turn what the assistant should do (resolve a conflict,
//! ask a proactive question, record data or give advice), prunes the context
//! sent to the language model and validates what comes back.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
