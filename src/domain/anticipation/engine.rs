//! Rule evaluation.

use super::guidance::AnticipationGuidance;
use super::rules::{AnticipationRule, DEFAULT_RULES};
use crate::domain::conversation::ConversationTurn;
use crate::domain::foundation::Chapter;
use crate::domain::wizard::WizardState;

/// Picks the single most urgent guidance for the chapter being viewed.
#[derive(Debug, Clone)]
pub struct AnticipationEngine {
    rules: &'static [AnticipationRule],
}

impl AnticipationEngine {
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES,
        }
    }

    pub fn with_rules(rules: &'static [AnticipationRule]) -> Self {
        Self { rules }
    }

    /// Returns the highest-priority matching rule as guidance, or `None`.
    ///
    /// Equal priorities resolve to the rule declared first.
    pub fn evaluate(&self, state: &WizardState, chapter: Chapter) -> Option<AnticipationGuidance> {
        self.evaluate_unasked(state, chapter, &[])
    }

    /// Like [`evaluate`](Self::evaluate), but skips rules whose question an
    /// assistant turn in `history` already asked.
    pub fn evaluate_unasked(
        &self,
        state: &WizardState,
        chapter: Chapter,
        history: &[ConversationTurn],
    ) -> Option<AnticipationGuidance> {
        let project_type = state.project_type();
        let asked: Vec<&str> = history
            .iter()
            .filter(|turn| !turn.is_user())
            .filter_map(|turn| turn.guidance_asked.as_deref())
            .collect();

        let best = self
            .rules
            .iter()
            .filter(|rule| !asked.contains(&rule.id))
            .filter(|rule| rule.applies_to(chapter, project_type))
            .filter(|rule| rule.condition.holds(state))
            .fold(None::<&AnticipationRule>, |best, rule| match best {
                Some(current) if current.priority.rank() <= rule.priority.rank() => Some(current),
                _ => Some(rule),
            })?;

        tracing::debug!(rule = best.id, priority = %best.priority, %chapter, "Anticipation rule matched");

        Some(AnticipationGuidance {
            id: best.id.to_string(),
            priority: best.priority,
            chapter: best.target,
            question: best.question.to_string(),
            reasoning: best.reasoning.to_string(),
            related_fields: best.related_fields.iter().map(|f| f.to_string()).collect(),
        })
    }
}

impl Default for AnticipationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::anticipation::{AnticipationPriority, Condition};
    use crate::domain::wizard::ProjectType;
    use serde_json::json;

    #[test]
    fn empty_state_never_panics() {
        let engine = AnticipationEngine::new();
        for chapter in Chapter::all() {
            let _ = engine.evaluate(&WizardState::new(), *chapter);
        }
        assert!(engine.evaluate(&WizardState::new(), Chapter::Wensen).is_none());
    }

    #[test]
    fn must_have_wish_without_budget_probes_budget() {
        let state = WizardState::new().with_chapter(
            Chapter::Wensen,
            json!({ "wishes": [{ "text": "Tweede badkamer", "priority": "must" }] }),
        );

        let guidance = AnticipationEngine::new()
            .evaluate(&state, Chapter::Wensen)
            .expect("guidance");

        assert_eq!(guidance.id, "must_have_without_budget");
        assert_eq!(guidance.priority, AnticipationPriority::High);
        assert_eq!(guidance.chapter, Chapter::Budget);
    }

    #[test]
    fn budget_present_silences_must_have_rule() {
        let state = WizardState::new()
            .with_chapter(Chapter::Wensen, json!({ "wishes": [{ "priority": "must" }] }))
            .with_chapter(Chapter::Budget, json!({ "budgetTotaal": 300000 }));

        assert!(AnticipationEngine::new().evaluate(&state, Chapter::Wensen).is_none());
    }

    #[test]
    fn asked_rule_is_not_repeated() {
        let state = WizardState::new().with_chapter(
            Chapter::Wensen,
            json!({ "wishes": [{ "text": "Tweede badkamer", "priority": "must" }] }),
        );
        let history = vec![
            ConversationTurn::assistant("Welk budget heb je in gedachten?")
                .with_guidance(Some("must_have_without_budget".to_string())),
            ConversationTurn::user("Goede vraag"),
        ];

        let engine = AnticipationEngine::new();
        assert!(engine.evaluate_unasked(&state, Chapter::Wensen, &history).is_none());
        assert!(engine.evaluate_unasked(&state, Chapter::Wensen, &[]).is_some());
    }

    #[test]
    fn user_turns_do_not_count_as_asked() {
        let state = WizardState::new()
            .with_chapter(Chapter::Basis, json!({ "projectType": "renovatie" }));
        let history = vec![ConversationTurn::user("Bouwjaar?")
            .with_guidance(Some("renovation_building_year".to_string()))];

        let guidance = AnticipationEngine::new().evaluate_unasked(&state, Chapter::Basis, &history);
        assert_eq!(guidance.map(|g| g.id), Some("renovation_building_year".to_string()));
    }

    #[test]
    fn asked_critical_rule_falls_through_to_next_match() {
        let state = WizardState::new()
            .with_chapter(Chapter::Basis, json!({ "leefstijl": { "kinderen": true } }))
            .with_chapter(
                Chapter::Ruimtes,
                json!({ "rooms": [{ "name": "woonkamer", "notes": "fundering herstellen" }] }),
            );
        let history = vec![ConversationTurn::assistant("Is de fundering onderzocht?")
            .with_guidance(Some("structural_risk_rooms".to_string()))];

        let guidance = AnticipationEngine::new()
            .evaluate_unasked(&state, Chapter::Ruimtes, &history)
            .expect("guidance");

        assert_eq!(guidance.id, "lifestyle_children");
    }

    #[test]
    fn critical_structural_rule_beats_lifestyle_rules() {
        let state = WizardState::new()
            .with_chapter(Chapter::Basis, json!({ "leefstijl": { "kinderen": true } }))
            .with_chapter(
                Chapter::Ruimtes,
                json!({ "rooms": [{ "name": "woonkamer", "notes": "fundering herstellen" }] }),
            );

        let guidance = AnticipationEngine::new()
            .evaluate(&state, Chapter::Ruimtes)
            .expect("guidance");

        assert!(guidance.is_critical());
        assert_eq!(guidance.id, "structural_risk_rooms");
    }

    #[test]
    fn equal_priority_resolves_to_first_declared() {
        let state = WizardState::new().with_chapter(
            Chapter::Basis,
            json!({ "leefstijl": { "kooktVeel": true, "kinderen": true, "thuiswerken": true } }),
        );

        let guidance = AnticipationEngine::new()
            .evaluate(&state, Chapter::Ruimtes)
            .expect("guidance");

        assert_eq!(guidance.id, "lifestyle_children");
    }

    #[test]
    fn new_build_sustainability_only_for_nieuwbouw() {
        let nieuwbouw = WizardState::new()
            .with_chapter(Chapter::Basis, json!({ "projectType": "Nieuwbouw" }));
        let verbouw = WizardState::new().with_chapter(
            Chapter::Basis,
            json!({ "projectType": "verbouw", "bouwjaar": 1965 }),
        );

        let engine = AnticipationEngine::new();
        assert_eq!(
            engine.evaluate(&nieuwbouw, Chapter::Basis).map(|g| g.id),
            Some("new_build_sustainability".to_string())
        );
        assert!(engine.evaluate(&verbouw, Chapter::Basis).is_none());
    }

    #[test]
    fn renovation_without_year_is_high_priority() {
        let state = WizardState::new()
            .with_chapter(Chapter::Basis, json!({ "projectType": "renovatie" }));

        let guidance = AnticipationEngine::new()
            .evaluate(&state, Chapter::Basis)
            .expect("guidance");

        assert_eq!(guidance.id, "renovation_building_year");
        assert_eq!(guidance.priority, AnticipationPriority::High);
    }

    #[test]
    fn custom_rule_table() {
        static RULES: &[AnticipationRule] = &[AnticipationRule {
            id: "always",
            chapters: &[Chapter::Risico],
            project_types: &[ProjectType::Onbekend],
            priority: AnticipationPriority::Medium,
            condition: Condition::All(&[]),
            target: Chapter::Risico,
            question: "Vraag",
            reasoning: "Reden",
            related_fields: &[],
        }];

        let guidance = AnticipationEngine::with_rules(RULES).evaluate(&WizardState::new(), Chapter::Risico);
        assert_eq!(guidance.map(|g| g.id), Some("always".to_string()));
    }
}
