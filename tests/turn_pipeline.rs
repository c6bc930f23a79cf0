//! Integration tests for the turn pipeline.
//!
//! Runs whole turns through the pipeline with the mock AI provider behind the
//! provider language model and the in-memory conversation store.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use wizard_dialogue::adapters::{
    InMemoryConversationStore, MockAIProvider, MockError, ProviderLanguageModel,
};
use wizard_dialogue::application::{DialogueSession, TurnInput, TurnPipeline, TurnPipelineConfig};
use wizard_dialogue::domain::feedback::{FieldTrigger, TriggerSource};
use wizard_dialogue::domain::foundation::{Chapter, SessionId, Timestamp};
use wizard_dialogue::domain::planning::{Route, TurnGoal};
use wizard_dialogue::domain::response::FALLBACK_MESSAGE;
use wizard_dialogue::domain::wizard::WizardState;

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Harness {
    provider: MockAIProvider,
    store: Arc<InMemoryConversationStore>,
    pipeline: TurnPipeline,
    session: DialogueSession,
}

impl Harness {
    fn new(provider: MockAIProvider) -> Self {
        Self::with_state(provider, WizardState::new())
    }

    fn with_state(provider: MockAIProvider, state: WizardState) -> Self {
        let session_id = SessionId::new();
        let store = Arc::new(InMemoryConversationStore::new());
        let model = ProviderLanguageModel::new(Arc::new(provider.clone())).with_session(session_id);
        let pipeline = TurnPipeline::new(Arc::new(model), store.clone(), TurnPipelineConfig::default());

        Self {
            provider,
            store,
            pipeline,
            session: DialogueSession::new(session_id).with_state(state),
        }
    }
}

fn underfunded_new_build() -> WizardState {
    WizardState::new()
        .with_chapter(Chapter::Basis, json!({"projectType": "nieuwbouw"}))
        .with_chapter(Chapter::Ruimtes, json!({"rooms": [{"name": "woonkamer", "area": 200}]}))
        .with_chapter(Chapter::Budget, json!({"budgetTotaal": 100000}))
}

// =============================================================================
// Turns
// =============================================================================

#[tokio::test]
async fn data_turn_applies_model_patches() {
    let provider = MockAIProvider::new().with_response(
        r#"{"patches": [
            {"chapter": "budget", "delta": {"path": "budgetTotaal", "operation": "set", "value": 350000}},
            {"chapter": "zolder", "delta": {"path": "hoogte", "operation": "set", "value": 2}}
        ], "followUpQuestion": "Is dat inclusief btw?"}"#,
    );
    let mut h = Harness::new(provider);

    let outcome = h
        .pipeline
        .handle_message(&mut h.session, TurnInput::new("Ons budget is 350.000 euro"))
        .await;

    assert_eq!(outcome.plan.goal, TurnGoal::Patch);
    assert_eq!(outcome.result.draft_response, "Is dat inclusief btw?");
    assert_eq!(outcome.applied_patches.len(), 1);
    assert_eq!(outcome.state_version, 1);
    assert_eq!(h.session.wizard_state.number("budget.budgetTotaal"), Some(350000.0));
    assert_eq!(h.store.turn_count().await, 2);
}

#[tokio::test]
async fn blocking_conflict_takes_over_the_turn() {
    let mut h = Harness::with_state(
        MockAIProvider::new().with_response("Je budget is te krap voor 200 m²."),
        underfunded_new_build(),
    );

    let outcome = h
        .pipeline
        .handle_message(&mut h.session, TurnInput::new("Zullen we naar de keuken kijken?"))
        .await;

    assert_eq!(outcome.plan.goal, TurnGoal::ConflictResolution);
    assert_eq!(outcome.plan.route, Route::GuardRequired);
    assert!(outcome.plan.reasoning.contains("blocking"));
    assert!(outcome.result.confidence > 0.95);

    let prompt = h.provider.get_calls()[0].system_prompt.clone().unwrap_or_default();
    assert!(prompt.contains("Gesignaleerde conflicten"));
}

#[tokio::test]
async fn must_have_without_budget_probes_in_wishes_chapter() {
    let state = WizardState::new().with_chapter(
        Chapter::Wensen,
        json!({"wishes": [{"name": "thuiswerkplek", "priority": "must"}]}),
    );
    let mut h = Harness::with_state(
        MockAIProvider::new().with_response("Welk budget heb je in gedachten?"),
        state,
    );

    h.session.current_chapter = Some(Chapter::Wensen);

    let outcome = h
        .pipeline
        .handle_message(&mut h.session, TurnInput::new("Wat vind je ervan?"))
        .await;

    assert_eq!(outcome.plan.goal, TurnGoal::Probe);
    assert!(outcome.result.confidence > 0.8);
    assert_eq!(h.provider.call_count(), 1);
}

#[tokio::test]
async fn budget_asked_in_opening_can_be_answered_by_chat() {
    let state = WizardState::new().with_chapter(
        Chapter::Wensen,
        json!({"wishes": [{"name": "thuiswerkplek", "priority": "must"}]}),
    );
    let provider = MockAIProvider::new().with_response(
        r#"{"patches": [{"chapter": "budget", "delta": {"path": "budgetTotaal", "operation": "set", "value": 350000}}]}"#,
    );
    let mut h = Harness::with_state(provider, state);

    let opening = h.pipeline.enter_chapter(&mut h.session, Chapter::Wensen).await;
    assert_eq!(opening.map(|o| o.turn_goal), Some(TurnGoal::Probe));

    let outcome = h
        .pipeline
        .handle_message(&mut h.session, TurnInput::new("Ons budget is 350.000 euro"))
        .await;

    assert_eq!(outcome.plan.goal, TurnGoal::Patch);
    assert_eq!(outcome.applied_patches.len(), 1);
    assert_eq!(h.session.wizard_state.number("budget.budgetTotaal"), Some(350000.0));
}

#[tokio::test]
async fn provider_failure_returns_fallback_and_keeps_state() {
    let mut h = Harness::new(MockAIProvider::new().with_error(MockError::Unavailable));

    let outcome = h
        .pipeline
        .handle_message(&mut h.session, TurnInput::new("Ons budget is 350.000 euro"))
        .await;

    assert_eq!(outcome.result.confidence, 0.0);
    assert_eq!(outcome.result.draft_response, FALLBACK_MESSAGE);
    assert!(outcome.applied_patches.is_empty());
    assert_eq!(h.session.wizard_state.state_version, 0);
    assert_eq!(h.store.turn_count().await, 2);
}

#[tokio::test]
async fn unparseable_patch_reply_returns_fallback() {
    let mut h = Harness::new(MockAIProvider::new().with_response("Genoteerd, dank je!"));

    let outcome = h
        .pipeline
        .handle_message(&mut h.session, TurnInput::new("We willen 4 slaapkamers"))
        .await;

    assert!(outcome.result.is_fallback());
}

// =============================================================================
// Chapters
// =============================================================================

#[tokio::test]
async fn every_chapter_opens_once() {
    let mut h = Harness::new(MockAIProvider::new());

    for chapter in Chapter::all() {
        let opening = h.pipeline.enter_chapter(&mut h.session, *chapter).await;
        let opening = opening.expect("new chapter must open");
        assert!(!opening.message.is_empty());
        assert_eq!(opening.focus_chapter, *chapter);

        assert!(h.pipeline.enter_chapter(&mut h.session, *chapter).await.is_none());
    }

    assert_eq!(h.store.turn_count().await, Chapter::all().len());
    assert_eq!(h.provider.call_count(), 0);
}

// =============================================================================
// Feedback
// =============================================================================

#[tokio::test(start_paused = true)]
async fn debounced_edits_feed_the_next_turn() {
    let mut h = Harness::new(MockAIProvider::new().with_response("Dat budget is ruim voldoende."));
    let queue = h.pipeline.feedback_queue();
    let (sender, mut flushed) = mpsc::unbounded_channel();
    queue.on_flush(move |batch| {
        let _ = sender.send(batch);
    });

    for (i, value) in [100, 200, 300].into_iter().enumerate() {
        queue.add(vec![FieldTrigger::new(
            Chapter::Budget,
            "budget.budgetTotaal",
            json!(value),
            TriggerSource::User,
        )
        .with_timestamp(Timestamp::from_millis(i as i64 + 1))]);
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    tokio::time::sleep(Duration::from_millis(1_000)).await;

    let batch = flushed.recv().await.expect("one flush");
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].new_value, json!(300));
    assert!(flushed.try_recv().is_err());

    let trigger_id = batch[0].id.clone();
    h.pipeline
        .handle_message(&mut h.session, TurnInput::new("Is dit genoeg?").with_triggers(batch))
        .await;

    assert_eq!(h.session.focused_field.as_deref(), Some("budget.budgetTotaal"));
    let turns = h.store.all_turns().await;
    assert_eq!(turns[1].triggers_handled, vec![trigger_id]);
}
