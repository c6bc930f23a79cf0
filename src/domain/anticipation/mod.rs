//! Proactive guidance.
//!
//! A declarative rule table maps project type, chapter and field predicates
//! to a single question worth raising before the user asks for it. The
//! engine returns at most one guidance per turn.

mod engine;
mod guidance;
mod rules;

pub use engine::AnticipationEngine;
pub use guidance::{AnticipationGuidance, AnticipationPriority};
pub use rules::{AnticipationRule, Condition, DEFAULT_RULES};
