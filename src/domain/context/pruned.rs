//! Pruner output.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::full_context::{CustomerExample, KnowledgeNugget};
use crate::domain::anticipation::AnticipationGuidance;
use crate::domain::behavior::BehaviorProfile;
use crate::domain::conflict::SystemConflict;
use crate::domain::conversation::ConversationTurn;
use crate::domain::foundation::Chapter;
use crate::domain::planning::TurnPlan;

/// Token-budgeted payload sent to the language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrunedContext {
    pub chapter_answers: BTreeMap<Chapter, Value>,
    /// Oldest first.
    pub history: Vec<ConversationTurn>,
    pub behavior: BehaviorProfile,
    /// Plan without its conflict or guidance payload; those are budgeted
    /// separately below.
    pub plan: TurnPlan,
    #[serde(default)]
    pub conflicts: Vec<SystemConflict>,
    #[serde(default)]
    pub anticipation: Option<AnticipationGuidance>,
    #[serde(default)]
    pub kb_nuggets: Vec<KnowledgeNugget>,
    #[serde(default)]
    pub customer_examples: Vec<CustomerExample>,
    pub token_estimate: u32,
    #[serde(default)]
    pub prune_log: Vec<String>,
    pub focused_chapter: Option<Chapter>,
    pub focused_field: Option<String>,
}

impl PrunedContext {
    pub fn includes_chapter(&self, chapter: Chapter) -> bool {
        self.chapter_answers.contains_key(&chapter)
    }

    pub fn was_pruned(&self) -> bool {
        !self.prune_log.is_empty()
    }
}
