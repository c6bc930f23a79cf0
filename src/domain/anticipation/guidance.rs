//! Guidance value types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::Chapter;

/// Urgency of a proactive question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnticipationPriority {
    Critical,
    High,
    Medium,
}

impl AnticipationPriority {
    /// Lower rank means more urgent.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
        }
    }
}

impl fmt::Display for AnticipationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
        }
    }
}

/// A single proactive question to surface this turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnticipationGuidance {
    pub id: String,
    pub priority: AnticipationPriority,
    pub chapter: Chapter,
    pub question: String,
    pub reasoning: String,
    #[serde(default)]
    pub related_fields: Vec<String>,
}

impl AnticipationGuidance {
    pub fn is_critical(&self) -> bool {
        self.priority == AnticipationPriority::Critical
    }

    /// Rough serialized size used for token budgeting.
    pub fn estimate_tokens(&self) -> u32 {
        let chars = self.question.chars().count()
            + self.reasoning.chars().count()
            + self.related_fields.iter().map(|f| f.len()).sum::<usize>()
            + 32;
        chars.div_ceil(4) as u32
    }
}
