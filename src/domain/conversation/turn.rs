//! A single message in the conversation history.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{Timestamp, TurnId};
use crate::domain::wizard::Patch;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One message in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub id: TurnId,
    pub role: TurnRole,
    pub text: String,
    pub timestamp: Timestamp,
    /// Wizard state as it was when the turn was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_snapshot: Option<Value>,
    /// Field-trigger ids this turn responded to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers_handled: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches_applied: Vec<Patch>,
    /// Anticipation rule whose question this turn asked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance_asked: Option<String>,
}

impl ConversationTurn {
    /// Creates a turn stamped with the current time.
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            role,
            text: text.into(),
            timestamp: Timestamp::now(),
            state_snapshot: None,
            triggers_handled: Vec::new(),
            patches_applied: Vec::new(),
            guidance_asked: None,
        }
    }

    /// Creates a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text)
    }

    /// Creates an assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, text)
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_snapshot(mut self, snapshot: Value) -> Self {
        self.state_snapshot = Some(snapshot);
        self
    }

    pub fn with_triggers(mut self, trigger_ids: Vec<String>) -> Self {
        self.triggers_handled = trigger_ids;
        self
    }

    pub fn with_patches(mut self, patches: Vec<Patch>) -> Self {
        self.patches_applied = patches;
        self
    }

    pub fn with_guidance(mut self, guidance_id: Option<String>) -> Self {
        self.guidance_asked = guidance_id;
        self
    }

    /// Returns true for user-authored turns.
    pub fn is_user(&self) -> bool {
        self.role == TurnRole::User
    }

    /// Estimates the token count of the turn text (~4 characters per token).
    pub fn estimate_tokens(&self) -> u32 {
        // Role marker overhead
        let overhead = 4;
        (self.text.chars().count().div_ceil(4) + overhead) as u32
    }
}
