//! Final turn output.

use serde::{Deserialize, Serialize};

use crate::domain::wizard::Patch;

/// Apology shown when the model call fails or returns nothing usable.
pub const FALLBACK_MESSAGE: &str =
    "Excuses, er ging iets mis bij het verwerken van je bericht. Kun je het nog een keer proberen?";

/// What the orchestrator hands back for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorResult {
    pub draft_response: String,
    /// Validated patches only.
    #[serde(default)]
    pub patches: Vec<Patch>,
    pub tokens_used: u32,
    /// Between 0 and 1; exactly 0 for the fallback.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_question: Option<String>,
}

impl OrchestratorResult {
    /// Zero-confidence apology without patches.
    pub fn fallback() -> Self {
        Self {
            draft_response: FALLBACK_MESSAGE.to_string(),
            patches: Vec::new(),
            tokens_used: 0,
            confidence: 0.0,
            follow_up_question: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.confidence == 0.0 && self.draft_response == FALLBACK_MESSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_has_zero_confidence_and_no_patches() {
        let result = OrchestratorResult::fallback();
        assert_eq!(result.confidence, 0.0);
        assert!(result.patches.is_empty());
        assert!(!result.draft_response.is_empty());
        assert!(result.is_fallback());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(OrchestratorResult::fallback()).unwrap();
        assert!(json.get("draftResponse").is_some());
        assert_eq!(json["tokensUsed"], 0);
    }
}
