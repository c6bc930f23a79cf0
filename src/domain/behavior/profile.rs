//! Behavior profile value types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversational tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Warm,
    Direct,
    #[default]
    Neutral,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warm => write!(f, "warm"),
            Self::Direct => write!(f, "direct"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// How sure of themselves the user appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// Preferred pace of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedPreference {
    Quick,
    #[default]
    Balanced,
    Thorough,
}

/// Interaction-style signals derived from the last user turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorProfile {
    pub overwhelmed: bool,
    pub confused: bool,
    pub impatient: bool,
    pub engaged: bool,
    pub tone_hint: Tone,
    pub confidence_level: ConfidenceLevel,
    pub speed_preference: SpeedPreference,
    /// Number of user turns the profile was derived from.
    pub turn_count: usize,
}

impl BehaviorProfile {
    /// True when the user needs extra care (overwhelmed or confused).
    pub fn needs_support(&self) -> bool {
        self.overwhelmed || self.confused
    }
}
