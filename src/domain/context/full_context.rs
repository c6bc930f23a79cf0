//! Pruner input bundle.

use serde::{Deserialize, Serialize};

use crate::domain::anticipation::AnticipationGuidance;
use crate::domain::behavior::BehaviorProfile;
use crate::domain::conflict::SystemConflict;
use crate::domain::conversation::ConversationTurn;
use crate::domain::foundation::Chapter;
use crate::domain::planning::TurnPlan;
use crate::domain::wizard::WizardState;

/// A ranked knowledge-base snippet supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeNugget {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Higher is more relevant.
    pub relevance: f64,
}

impl KnowledgeNugget {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        relevance: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            relevance,
        }
    }
}

/// A ranked reference project from earlier customers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerExample {
    pub id: String,
    pub summary: String,
    pub relevance: f64,
}

impl CustomerExample {
    pub fn new(id: impl Into<String>, summary: impl Into<String>, relevance: f64) -> Self {
        Self {
            id: id.into(),
            summary: summary.into(),
            relevance,
        }
    }
}

/// Everything the pruner may choose from.
#[derive(Debug, Clone)]
pub struct FullContext {
    pub wizard_state: WizardState,
    pub plan: TurnPlan,
    pub behavior: BehaviorProfile,
    /// Oldest first.
    pub history: Vec<ConversationTurn>,
    pub conflicts: Vec<SystemConflict>,
    pub anticipation: Option<AnticipationGuidance>,
    pub kb_nuggets: Vec<KnowledgeNugget>,
    pub customer_examples: Vec<CustomerExample>,
    pub focused_chapter: Option<Chapter>,
    pub focused_field: Option<String>,
}

impl FullContext {
    pub fn new(wizard_state: WizardState, plan: TurnPlan, behavior: BehaviorProfile) -> Self {
        Self {
            wizard_state,
            plan,
            behavior,
            history: Vec::new(),
            conflicts: Vec::new(),
            anticipation: None,
            kb_nuggets: Vec::new(),
            customer_examples: Vec::new(),
            focused_chapter: None,
            focused_field: None,
        }
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_conflicts(mut self, conflicts: Vec<SystemConflict>) -> Self {
        self.conflicts = conflicts;
        self
    }

    pub fn with_anticipation(mut self, guidance: Option<AnticipationGuidance>) -> Self {
        self.anticipation = guidance;
        self
    }

    pub fn with_knowledge(
        mut self,
        kb_nuggets: Vec<KnowledgeNugget>,
        customer_examples: Vec<CustomerExample>,
    ) -> Self {
        self.kb_nuggets = kb_nuggets;
        self.customer_examples = customer_examples;
        self
    }

    pub fn with_focus(mut self, chapter: Option<Chapter>, field: Option<String>) -> Self {
        self.focused_chapter = chapter;
        self.focused_field = field;
        self
    }

    /// Focused chapter, falling back to the prefix of the focused field.
    pub fn effective_focus(&self) -> Option<Chapter> {
        self.focused_chapter.or_else(|| {
            self.focused_field
                .as_deref()
                .and_then(|field| field.split('.').next())
                .and_then(|key| key.parse().ok())
        })
    }
}
