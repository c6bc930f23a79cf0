//! Chapter start handler.
//!
//! Runs once per chapter transition and produces the opening message for
//! the new chapter without calling the language model.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::anticipation::AnticipationEngine;
use crate::domain::behavior::BehaviorAnalyzer;
use crate::domain::conflict::{ConflictDetector, RuleBasedConflictDetector};
use crate::domain::conversation::ConversationTurn;
use crate::domain::foundation::Chapter;
use crate::domain::planning::{TurnGoal, TurnPlan, TurnPlanner, TurnPriority};
use crate::domain::wizard::WizardState;

use super::templates::{template_for_chapter, tone_prefix, CONFLICT_LEAD, GUIDANCE_LEAD};

/// Opening for a newly entered chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterOpeningResponse {
    pub message: String,
    pub turn_goal: TurnGoal,
    pub allow_patches: bool,
    pub focus_chapter: Chapter,
    /// Anticipation rule the opening asks about, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance_id: Option<String>,
}

/// Builds chapter openings from anticipation, conflicts, behavior and the planner.
pub struct ChapterInitializer {
    anticipation: AnticipationEngine,
    conflicts: Arc<dyn ConflictDetector>,
    behavior: BehaviorAnalyzer,
    planner: TurnPlanner,
}

impl ChapterInitializer {
    pub fn new(conflicts: Arc<dyn ConflictDetector>, behavior: BehaviorAnalyzer) -> Self {
        Self {
            anticipation: AnticipationEngine::new(),
            conflicts,
            behavior,
            planner: TurnPlanner::new(),
        }
    }

    pub fn with_anticipation(mut self, engine: AnticipationEngine) -> Self {
        self.anticipation = engine;
        self
    }

    /// Opening for `chapter`. Missing state or history is treated as empty.
    pub fn handle_chapter_start(
        &self,
        chapter: Chapter,
        state: Option<&WizardState>,
        history: &[ConversationTurn],
    ) -> ChapterOpeningResponse {
        let empty = WizardState::new();
        let state = state.unwrap_or(&empty);

        let resuming = state.chapter_has_answers(chapter);
        let guidance = self.anticipation.evaluate_unasked(state, chapter, history);
        let conflicts = self.conflicts.detect(state);
        let profile = self.behavior.analyze(history);
        let plan = opening_plan(self.planner.plan(
            Some(&profile),
            &conflicts,
            guidance.as_ref(),
            "",
        ));

        tracing::info!(
            chapter = %chapter,
            goal = %plan.goal,
            resuming,
            conflicts = conflicts.len(),
            guidance = guidance.as_ref().map(|g| g.id.as_str()).unwrap_or("none"),
            "Chapter started"
        );

        ChapterOpeningResponse {
            message: render_opening(chapter, &plan, resuming),
            turn_goal: plan.goal,
            allow_patches: plan.allow_patches,
            focus_chapter: chapter,
            guidance_id: asked_guidance(&plan),
        }
    }
}

impl Default for ChapterInitializer {
    fn default() -> Self {
        Self::new(Arc::new(RuleBasedConflictDetector::new()), BehaviorAnalyzer::default())
    }
}

/// Id of the guidance a turn with this plan puts to the user.
pub(crate) fn asked_guidance(plan: &TurnPlan) -> Option<String> {
    plan.anticipation
        .as_ref()
        .filter(|_| plan.goal.is_anticipation_driven())
        .map(|guidance| guidance.id.clone())
}

/// An opening without conflicts or guidance invites data entry.
fn opening_plan(plan: TurnPlan) -> TurnPlan {
    if plan.priority != TurnPriority::UserQuery {
        return plan;
    }

    let mut opening = plan;
    opening.goal = TurnGoal::FillData;
    opening.allow_patches = true;
    opening.reasoning = "chapter opening: collecting data".to_string();
    opening
}

fn render_opening(chapter: Chapter, plan: &TurnPlan, resuming: bool) -> String {
    let template = template_for_chapter(chapter);
    let mut parts: Vec<String> = Vec::new();

    if let Some(prefix) = tone_prefix(plan.tone) {
        parts.push(prefix.to_string());
    }

    if resuming {
        parts.push(format!("We pakken het hoofdstuk {} weer op.", chapter.display_name()));
    } else {
        parts.push(template.intro.to_string());
    }

    match plan.goal {
        TurnGoal::ConflictResolution => match plan.conflicts.first() {
            Some(conflict) => parts.push(format!(
                "{} {} {}",
                CONFLICT_LEAD, conflict.description, conflict.resolution_hint
            )),
            None => parts.push(template.question.to_string()),
        },
        TurnGoal::Probe => match &plan.anticipation {
            Some(guidance) => parts.push(format!("{} {}", GUIDANCE_LEAD, guidance.question)),
            None => parts.push(template.question.to_string()),
        },
        _ if resuming => parts.push("Wil je iets aanvullen of aanpassen?".to_string()),
        _ => parts.push(template.question.to_string()),
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::behavior::Tone;
    use serde_json::json;

    fn initializer() -> ChapterInitializer {
        ChapterInitializer::default()
    }

    mod openings {
        use super::*;

        #[test]
        fn every_chapter_gets_a_dutch_message() {
            for chapter in Chapter::all() {
                let opening = initializer().handle_chapter_start(*chapter, None, &[]);

                assert!(!opening.message.is_empty());
                assert_eq!(opening.focus_chapter, *chapter);
            }
        }

        #[test]
        fn plain_opening_invites_data() {
            let opening = initializer().handle_chapter_start(Chapter::Ruimtes, None, &[]);

            assert_eq!(opening.turn_goal, TurnGoal::FillData);
            assert!(opening.allow_patches);
            assert!(opening.message.contains("ruimtes"));
        }

        #[test]
        fn resumed_chapter_is_acknowledged() {
            let state = WizardState::new()
                .with_chapter(Chapter::Wensen, json!({"wishes": [{"naam": "serre", "priority": "nice"}]}));

            let opening = initializer().handle_chapter_start(Chapter::Wensen, Some(&state), &[]);

            assert!(opening.message.contains("weer op"));
        }
    }

    mod signals {
        use super::*;

        #[test]
        fn blocking_conflict_leads_the_opening() {
            let state = WizardState::new()
                .with_chapter(Chapter::Basis, json!({"projectType": "nieuwbouw"}))
                .with_chapter(Chapter::Ruimtes, json!({"rooms": [{"naam": "woonkamer", "area": 200}]}))
                .with_chapter(Chapter::Budget, json!({"budgetTotaal": 100000}));

            let opening = initializer().handle_chapter_start(Chapter::Techniek, Some(&state), &[]);

            assert_eq!(opening.turn_goal, TurnGoal::ConflictResolution);
            assert!(!opening.allow_patches);
            assert!(opening.message.contains(CONFLICT_LEAD));
        }

        #[test]
        fn must_have_without_budget_probes() {
            let state = WizardState::new().with_chapter(
                Chapter::Wensen,
                json!({"wishes": [{"naam": "thuiswerkplek", "priority": "must"}]}),
            );

            let opening = initializer().handle_chapter_start(Chapter::Budget, Some(&state), &[]);

            assert_eq!(opening.turn_goal, TurnGoal::Probe);
            assert!(opening.message.contains(GUIDANCE_LEAD));
            assert_eq!(opening.guidance_id.as_deref(), Some("must_have_without_budget"));
        }

        #[test]
        fn guidance_already_asked_is_not_repeated() {
            let state = WizardState::new().with_chapter(
                Chapter::Wensen,
                json!({"wishes": [{"naam": "thuiswerkplek", "priority": "must"}]}),
            );
            let history = vec![ConversationTurn::assistant("Welk budget heb je?")
                .with_guidance(Some("must_have_without_budget".to_string()))];

            let opening = initializer().handle_chapter_start(Chapter::Budget, Some(&state), &history);

            assert_eq!(opening.turn_goal, TurnGoal::FillData);
            assert!(opening.allow_patches);
            assert!(opening.guidance_id.is_none());
        }

        #[test]
        fn overwhelmed_history_softens_tone() {
            let history = vec![
                ConversationTurn::user("Ik snap er niks van, dit is te veel"),
                ConversationTurn::assistant("Geen probleem."),
            ];

            let opening = initializer().handle_chapter_start(Chapter::Basis, None, &history);

            assert!(opening
                .message
                .starts_with(tone_prefix(Tone::Warm).unwrap_or_default()));
        }
    }
}
