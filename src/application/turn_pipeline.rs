//! Turn pipeline.
//!
//! Runs one user message through behavior analysis, anticipation, conflict
//! detection, planning, pruning and orchestration, then applies accepted
//! patches to the caller's session and records both turns.
//!
//! Session state is owned by the caller and passed in on every call.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::anticipation::AnticipationEngine;
use crate::domain::behavior::{BehaviorAnalyzer, DEFAULT_BEHAVIOR_WINDOW};
use crate::domain::conflict::{ConflictDetector, RuleBasedConflictDetector};
use crate::domain::context::{
    ContextPruner, CustomerExample, FullContext, KnowledgeNugget, PrunerConfig,
};
use crate::domain::conversation::ConversationTurn;
use crate::domain::feedback::{FeedbackQueue, FeedbackQueueConfig, FieldTrigger};
use crate::domain::foundation::{Chapter, SessionId};
use crate::domain::planning::{TurnPlan, TurnPlanner};
use crate::domain::response::OrchestratorResult;
use crate::domain::wizard::{Patch, WizardState};
use crate::ports::{ConversationStore, LanguageModel, DEFAULT_LOAD_TURNS, DEFAULT_RELEVANT_LIMIT};

use super::chapter_start::{asked_guidance, ChapterInitializer, ChapterOpeningResponse};
use super::orchestrator::{GenerateRequest, ResponseOrchestrator};

/// Per-session state owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueSession {
    pub session_id: SessionId,
    pub wizard_state: WizardState,
    pub current_chapter: Option<Chapter>,
    /// Full dotted path, e.g. `budget.budgetTotaal`.
    pub focused_field: Option<String>,
}

impl DialogueSession {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: WizardState) -> Self {
        self.wizard_state = state;
        self
    }

    pub fn with_focused_field(mut self, field: impl Into<String>) -> Self {
        self.focused_field = Some(field.into());
        self
    }
}

/// One incoming user message plus optional caller-supplied knowledge.
#[derive(Debug, Clone, Default)]
pub struct TurnInput {
    pub message: String,
    pub kb_nuggets: Vec<KnowledgeNugget>,
    pub customer_examples: Vec<CustomerExample>,
    /// Field changes flushed from a [`FeedbackQueue`] since the last turn.
    pub field_triggers: Vec<FieldTrigger>,
}

impl TurnInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
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

    pub fn with_triggers(mut self, triggers: Vec<FieldTrigger>) -> Self {
        self.field_triggers = triggers;
        self
    }
}

/// A validated patch the wizard state refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedPatch {
    pub patch: Patch,
    pub reason: String,
}

/// Everything one turn produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub result: OrchestratorResult,
    pub plan: TurnPlan,
    pub applied_patches: Vec<Patch>,
    pub rejected_patches: Vec<RejectedPatch>,
    pub state_version: u64,
}

/// Pipeline limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnPipelineConfig {
    pub pruner: PrunerConfig,
    pub behavior_window: usize,
    pub feedback: FeedbackQueueConfig,
    pub store_history_turns: usize,
    pub model_timeout: Duration,
}

impl Default for TurnPipelineConfig {
    fn default() -> Self {
        Self {
            pruner: PrunerConfig::default(),
            behavior_window: DEFAULT_BEHAVIOR_WINDOW,
            feedback: FeedbackQueueConfig::default(),
            store_history_turns: DEFAULT_LOAD_TURNS,
            model_timeout: Duration::from_secs(30),
        }
    }
}

pub struct TurnPipeline {
    store: Arc<dyn ConversationStore>,
    orchestrator: ResponseOrchestrator,
    conflicts: Arc<dyn ConflictDetector>,
    analyzer: BehaviorAnalyzer,
    anticipation: AnticipationEngine,
    planner: TurnPlanner,
    pruner: ContextPruner,
    initializer: ChapterInitializer,
    config: TurnPipelineConfig,
}

impl TurnPipeline {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        store: Arc<dyn ConversationStore>,
        config: TurnPipelineConfig,
    ) -> Self {
        let conflicts: Arc<dyn ConflictDetector> = Arc::new(RuleBasedConflictDetector::new());
        Self {
            store,
            orchestrator: ResponseOrchestrator::new(model).with_timeout(config.model_timeout),
            analyzer: BehaviorAnalyzer::new(config.behavior_window),
            anticipation: AnticipationEngine::new(),
            planner: TurnPlanner::new(),
            pruner: ContextPruner::new(config.pruner),
            initializer: ChapterInitializer::new(
                conflicts.clone(),
                BehaviorAnalyzer::new(config.behavior_window),
            ),
            conflicts,
            config,
        }
    }

    /// Replaces the conflict detector for turns and chapter openings.
    pub fn with_conflict_detector(mut self, detector: Arc<dyn ConflictDetector>) -> Self {
        self.initializer = ChapterInitializer::new(
            detector.clone(),
            BehaviorAnalyzer::new(self.config.behavior_window),
        );
        self.conflicts = detector;
        self
    }

    pub fn config(&self) -> &TurnPipelineConfig {
        &self.config
    }

    /// Handles one user message. Never fails; model problems surface as the
    /// fallback result with no patches.
    pub async fn handle_message(
        &self,
        session: &mut DialogueSession,
        input: TurnInput,
    ) -> TurnOutcome {
        let TurnInput {
            message,
            kb_nuggets,
            customer_examples,
            field_triggers,
        } = input;

        if let Some(newest) = field_triggers.iter().max_by_key(|t| t.timestamp) {
            session.focused_field = Some(newest.field_path.clone());
        }

        let history = self.load_history(session.focused_field.as_deref()).await;
        let user_turn = ConversationTurn::user(message.as_str());

        let mut analyzed = history.clone();
        analyzed.push(user_turn.clone());
        let profile = self.analyzer.analyze(&analyzed);

        let guidance = session.current_chapter.and_then(|chapter| {
            self.anticipation
                .evaluate_unasked(&session.wizard_state, chapter, &history)
        });
        let conflicts = self.conflicts.detect(&session.wizard_state);
        let plan = self
            .planner
            .plan(Some(&profile), &conflicts, guidance.as_ref(), &message);

        let full = FullContext::new(session.wizard_state.clone(), plan.clone(), profile)
            .with_history(history)
            .with_conflicts(conflicts)
            .with_anticipation(guidance)
            .with_knowledge(kb_nuggets, customer_examples)
            .with_focus(session.current_chapter, session.focused_field.clone());
        let pruned = self.pruner.prune(&full);

        let result = self
            .orchestrator
            .generate(GenerateRequest {
                query: &message,
                plan: &plan,
                context: &pruned,
                behavior: Some(&profile),
            })
            .await;

        let (applied_patches, rejected_patches) =
            apply_patches(&mut session.wizard_state, &plan, &result.patches);

        tracing::info!(
            session_id = %session.session_id,
            goal = %plan.goal,
            confidence = result.confidence,
            applied = applied_patches.len(),
            rejected = rejected_patches.len(),
            state_version = session.wizard_state.state_version,
            "Turn handled"
        );

        let trigger_ids = field_triggers.into_iter().map(|t| t.id).collect();
        let assistant_turn = ConversationTurn::assistant(result.draft_response.as_str())
            .with_snapshot(session.wizard_state.snapshot())
            .with_triggers(trigger_ids)
            .with_patches(applied_patches.clone())
            .with_guidance(asked_guidance(&plan));
        self.record(user_turn).await;
        self.record(assistant_turn).await;

        TurnOutcome {
            result,
            plan,
            applied_patches,
            rejected_patches,
            state_version: session.wizard_state.state_version,
        }
    }

    /// Opens `chapter` unless it is already the current chapter.
    pub async fn enter_chapter(
        &self,
        session: &mut DialogueSession,
        chapter: Chapter,
    ) -> Option<ChapterOpeningResponse> {
        if session.current_chapter == Some(chapter) {
            return None;
        }

        let window = self.store.load(self.config.store_history_turns).await;
        let opening = self.initializer.handle_chapter_start(
            chapter,
            Some(&session.wizard_state),
            &window.recent,
        );

        session.current_chapter = Some(chapter);
        let focus_in_chapter = session
            .focused_field
            .as_deref()
            .and_then(|field| field.split('.').next())
            == Some(chapter.key());
        if !focus_in_chapter {
            session.focused_field = None;
        }

        self.record(
            ConversationTurn::assistant(opening.message.as_str())
                .with_snapshot(session.wizard_state.snapshot())
                .with_guidance(opening.guidance_id.clone()),
        )
        .await;

        Some(opening)
    }

    /// [`Self::enter_chapter`] for a raw chapter key; unknown keys are ignored.
    pub async fn enter_chapter_key(
        &self,
        session: &mut DialogueSession,
        key: &str,
    ) -> Option<ChapterOpeningResponse> {
        match key.parse::<Chapter>() {
            Ok(chapter) => self.enter_chapter(session, chapter).await,
            Err(err) => {
                tracing::warn!(key, error = %err, "Ignoring chapter start for unknown chapter");
                None
            }
        }
    }

    /// New debounce queue using the configured window and flush size.
    pub fn feedback_queue(&self) -> FeedbackQueue {
        FeedbackQueue::new(self.config.feedback)
    }

    async fn load_history(&self, focused_field: Option<&str>) -> Vec<ConversationTurn> {
        let window = self.store.load(self.config.store_history_turns).await;

        let keyword = match (window.has_long_history, focused_field) {
            (true, Some(field)) => field.rsplit('.').next().unwrap_or(field),
            _ => return window.recent,
        };

        let relevant = self
            .store
            .get_relevant_context(keyword, DEFAULT_RELEVANT_LIMIT)
            .await;
        merge_relevant(relevant, window.recent)
    }

    async fn record(&self, turn: ConversationTurn) {
        let turn_id = turn.id;
        if self.store.add_turn(turn).await.is_none() {
            tracing::warn!(turn_id = %turn_id, "Conversation store did not accept turn");
        }
    }
}

/// Older relevant turns in chronological order, then the recent window.
fn merge_relevant(
    relevant: Vec<ConversationTurn>,
    recent: Vec<ConversationTurn>,
) -> Vec<ConversationTurn> {
    let known: HashSet<_> = recent.iter().map(|turn| turn.id).collect();
    let mut earlier: Vec<ConversationTurn> = relevant
        .into_iter()
        .filter(|turn| !known.contains(&turn.id))
        .collect();
    earlier.sort_by_key(|turn| turn.timestamp);
    earlier.dedup_by_key(|turn| turn.id);
    earlier.extend(recent);
    earlier
}

fn apply_patches(
    state: &mut WizardState,
    plan: &TurnPlan,
    patches: &[Patch],
) -> (Vec<Patch>, Vec<RejectedPatch>) {
    if !plan.allow_patches {
        if !patches.is_empty() {
            tracing::warn!(goal = %plan.goal, count = patches.len(), "Plan does not allow patches");
        }
        let rejected = patches
            .iter()
            .map(|patch| RejectedPatch {
                patch: patch.clone(),
                reason: format!("patches not allowed for goal {}", plan.goal),
            })
            .collect();
        return (Vec::new(), rejected);
    }

    let mut applied = Vec::new();
    let mut rejected = Vec::new();
    for patch in patches {
        match state.apply_patch(patch) {
            Ok(_) => applied.push(patch.clone()),
            Err(err) => {
                tracing::warn!(field = %patch.field_path(), error = %err, "Patch rejected by wizard state");
                rejected.push(RejectedPatch {
                    patch: patch.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }
    (applied, rejected)
}
