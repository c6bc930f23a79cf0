//! Behavior analysis.
//!
//! Derives interaction-style signals from recent user turns so the planner
//! can adapt tone and pacing. Profiles are recomputed every turn and never
//! stored.

mod analyzer;
mod profile;

pub use analyzer::{BehaviorAnalyzer, DEFAULT_BEHAVIOR_WINDOW};
pub use profile::{BehaviorProfile, ConfidenceLevel, SpeedPreference, Tone};
