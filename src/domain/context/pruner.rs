//! Token-budgeted context selection.
//!
//! Selection order: essentials, focused chapter, conflicts, guidance,
//! history, knowledge, remaining chapters. Every item after the focused
//! chapter is admitted only while the running estimate stays strictly
//! below the ceiling.

use serde_json::Value;
use std::collections::BTreeMap;

use super::full_context::{CustomerExample, FullContext, KnowledgeNugget};
use super::pruned::PrunedContext;
use crate::domain::behavior::BehaviorProfile;
use crate::domain::conversation::ConversationTurn;
use crate::domain::foundation::Chapter;
use crate::domain::planning::TurnPlan;

/// Rough token count for a piece of text (~4 characters per token).
pub fn estimate_tokens(text: &str) -> u32 {
    text.chars().count().div_ceil(4) as u32
}

/// Pruning limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrunerConfig {
    /// Exclusive upper bound on the token estimate.
    pub token_ceiling: u32,
    pub history_window: usize,
    /// History window for probe and guidance turns.
    pub anticipation_history_window: usize,
    pub max_kb_nuggets: usize,
    pub max_customer_examples: usize,
}

impl Default for PrunerConfig {
    fn default() -> Self {
        Self {
            token_ceiling: 4_000,
            history_window: 3,
            anticipation_history_window: 2,
            max_kb_nuggets: 3,
            max_customer_examples: 2,
        }
    }
}

/// Builds a [`PrunedContext`] from a [`FullContext`].
#[derive(Debug, Clone, Default)]
pub struct ContextPruner {
    config: PrunerConfig,
}

/// Running budget plus the log of everything left out.
struct Budget {
    used: u32,
    ceiling: u32,
    log: Vec<String>,
}

impl Budget {
    fn fits(&self, cost: u32) -> bool {
        self.used.saturating_add(cost) < self.ceiling
    }

    /// Admits `cost` if it fits, otherwise records `reason`.
    fn admit(&mut self, cost: u32, reason: impl FnOnce() -> String) -> bool {
        if self.fits(cost) {
            self.used += cost;
            true
        } else {
            self.log.push(reason());
            false
        }
    }

    fn skip(&mut self, reason: String) {
        self.log.push(reason);
    }
}

impl ContextPruner {
    pub fn new(config: PrunerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PrunerConfig {
        &self.config
    }

    /// Selects what the model may see this turn.
    ///
    /// The estimate stays below the ceiling unless the focused chapter alone
    /// (with the essentials) reaches it; then only the focused chapter and
    /// the essentials are kept.
    pub fn prune(&self, full: &FullContext) -> PrunedContext {
        let goal = full.plan.goal;
        let focus = full.effective_focus();

        let mut budget = Budget {
            used: essentials_tokens(&full.behavior, &full.plan),
            ceiling: self.config.token_ceiling,
            log: Vec::new(),
        };

        let mut chapter_answers = BTreeMap::new();
        if let Some(chapter) = focus {
            let data = full.wizard_state.chapter_slice(chapter);
            budget.used = budget.used.saturating_add(chapter_tokens(chapter, &data));
            chapter_answers.insert(chapter, data);
        }

        let mut pruned = PrunedContext {
            chapter_answers,
            history: Vec::new(),
            behavior: full.behavior,
            plan: stripped_plan(&full.plan),
            conflicts: Vec::new(),
            anticipation: None,
            kb_nuggets: Vec::new(),
            customer_examples: Vec::new(),
            token_estimate: 0,
            prune_log: Vec::new(),
            focused_chapter: focus,
            focused_field: full.focused_field.clone(),
        };

        if !budget.fits(0) {
            budget.skip(format!(
                "focused chapter '{}' fills the {}-token budget; all other context dropped",
                focus.map(|c| c.key()).unwrap_or("-"),
                self.config.token_ceiling
            ));
            pruned.token_estimate = budget.used;
            pruned.prune_log = budget.log;
            tracing::debug!(tokens = pruned.token_estimate, "Focused chapter exceeds budget");
            return pruned;
        }

        // Conflicts: all or nothing, only on conflict turns.
        if !full.conflicts.is_empty() {
            if goal.is_conflict_driven() {
                let cost: u32 = full.conflicts.iter().map(|c| c.estimate_tokens()).sum();
                if budget.admit(cost, || {
                    format!("{} conflict(s) do not fit the remaining budget", full.conflicts.len())
                }) {
                    pruned.conflicts = full.conflicts.clone();
                }
            } else {
                budget.skip(format!(
                    "{} conflict(s) omitted: not relevant for goal {}",
                    full.conflicts.len(),
                    goal
                ));
            }
        }

        if let Some(guidance) = &full.anticipation {
            if goal.is_anticipation_driven() {
                if budget.admit(guidance.estimate_tokens(), || {
                    format!("anticipation '{}' does not fit the remaining budget", guidance.id)
                }) {
                    pruned.anticipation = Some(guidance.clone());
                }
            } else {
                budget.skip(format!(
                    "anticipation '{}' omitted: not relevant for goal {}",
                    guidance.id, goal
                ));
            }
        }

        let window = if goal.is_anticipation_driven() {
            self.config.anticipation_history_window
        } else {
            self.config.history_window
        };
        pruned.history = self.select_history(full, window, &mut budget);

        if goal.is_data_entry() {
            pruned.kb_nuggets = select_ranked(
                &full.kb_nuggets,
                self.config.max_kb_nuggets,
                "knowledge nugget",
                |n: &KnowledgeNugget| n.relevance,
                |n| (n.id.clone(), nugget_tokens(n)),
                &mut budget,
            );
            pruned.customer_examples = select_ranked(
                &full.customer_examples,
                self.config.max_customer_examples,
                "customer example",
                |e: &CustomerExample| e.relevance,
                |e| (e.id.clone(), estimate_tokens(&e.summary) + 4),
                &mut budget,
            );
        } else {
            let knowledge = full.kb_nuggets.len() + full.customer_examples.len();
            if knowledge > 0 {
                budget.skip(format!(
                    "{} knowledge item(s) omitted: not used for goal {}",
                    knowledge, goal
                ));
            }
        }

        for chapter in Chapter::all() {
            if Some(*chapter) == focus || !full.wizard_state.chapter_has_answers(*chapter) {
                continue;
            }
            let data = full.wizard_state.chapter_slice(*chapter);
            if budget.admit(chapter_tokens(*chapter, &data), || {
                format!("chapter '{}' dropped: budget exhausted", chapter)
            }) {
                pruned.chapter_answers.insert(*chapter, data);
            }
        }

        pruned.token_estimate = budget.used;
        pruned.prune_log = budget.log;

        tracing::debug!(
            goal = %goal,
            tokens = pruned.token_estimate,
            chapters = pruned.chapter_answers.len(),
            history = pruned.history.len(),
            omitted = pruned.prune_log.len(),
            "Pruned context"
        );
        pruned
    }

    /// Newest turns first until the window or the budget runs out, returned
    /// oldest first.
    fn select_history(
        &self,
        full: &FullContext,
        window: usize,
        budget: &mut Budget,
    ) -> Vec<ConversationTurn> {
        let total = full.history.len();
        if total > window {
            budget.skip(format!(
                "{} older turn(s) outside the {}-turn history window",
                total - window,
                window
            ));
        }

        let mut selected = Vec::new();
        let candidates: Vec<_> = full.history.iter().rev().take(window).collect();
        for (i, turn) in candidates.iter().enumerate() {
            let remaining = candidates.len() - i;
            if !budget.admit(turn.estimate_tokens(), || {
                format!("{} history turn(s) dropped: budget exhausted", remaining)
            }) {
                break;
            }
            selected.push((*turn).clone());
        }
        selected.reverse();
        selected
    }
}

/// Sorts by descending relevance, keeps the top `limit` and admits them
/// while they fit.
fn select_ranked<T: Clone>(
    items: &[T],
    limit: usize,
    label: &str,
    relevance: impl Fn(&T) -> f64,
    describe: impl Fn(&T) -> (String, u32),
    budget: &mut Budget,
) -> Vec<T> {
    let mut ranked: Vec<&T> = items.iter().collect();
    ranked.sort_by(|a, b| relevance(b).total_cmp(&relevance(a)));

    if ranked.len() > limit {
        budget.skip(format!(
            "{} lower-ranked {}(s) beyond the top {}",
            ranked.len() - limit,
            label,
            limit
        ));
    }

    ranked
        .into_iter()
        .take(limit)
        .filter_map(|item| {
            let (id, cost) = describe(item);
            budget
                .admit(cost, || format!("{} '{}' dropped: budget exhausted", label, id))
                .then(|| item.clone())
        })
        .collect()
}

fn essentials_tokens(behavior: &BehaviorProfile, plan: &TurnPlan) -> u32 {
    let behavior_line = format!(
        "tone={} confidence={:?} speed={:?} overwhelmed={} confused={} impatient={} engaged={}",
        behavior.tone_hint,
        behavior.confidence_level,
        behavior.speed_preference,
        behavior.overwhelmed,
        behavior.confused,
        behavior.impatient,
        behavior.engaged
    );
    estimate_tokens(&behavior_line) + estimate_tokens(&plan.essentials()) + estimate_tokens(&plan.reasoning)
}

fn chapter_tokens(chapter: Chapter, data: &Value) -> u32 {
    let body = serde_json::to_string(data).unwrap_or_default();
    estimate_tokens(chapter.key()) + estimate_tokens(&body) + 1
}

fn nugget_tokens(nugget: &KnowledgeNugget) -> u32 {
    estimate_tokens(&nugget.title) + estimate_tokens(&nugget.content) + 4
}

fn stripped_plan(plan: &TurnPlan) -> TurnPlan {
    TurnPlan {
        conflicts: Vec::new(),
        anticipation: None,
        ..plan.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::anticipation::{AnticipationGuidance, AnticipationPriority};
    use crate::domain::behavior::Tone;
    use crate::domain::conflict::{ConflictSeverity, ConflictType, SystemConflict};
    use crate::domain::foundation::Timestamp;
    use crate::domain::planning::{Route, TurnGoal, TurnPriority};
    use crate::domain::wizard::WizardState;
    use proptest::prelude::*;
    use serde_json::json;
    use std::time::Instant;

    fn plan(goal: TurnGoal) -> TurnPlan {
        TurnPlan::new(goal, Tone::Neutral, TurnPriority::UserQuery, Route::Normal, "test")
    }

    fn state() -> WizardState {
        WizardState::new()
            .with_chapter(Chapter::Basis, json!({ "projectType": "nieuwbouw" }))
            .with_chapter(Chapter::Budget, json!({ "budgetTotaal": 400000 }))
            .with_chapter(Chapter::Wensen, json!({ "wishes": [{ "text": "serre" }] }))
    }

    fn history(n: usize) -> Vec<ConversationTurn> {
        (0..n)
            .map(|i| {
                ConversationTurn::user(format!("bericht {}", i))
                    .with_timestamp(Timestamp::from_millis(i as i64 * 1000))
            })
            .collect()
    }

    fn context(goal: TurnGoal) -> FullContext {
        FullContext::new(state(), plan(goal), BehaviorProfile::default())
    }

    fn conflict(id: &str) -> SystemConflict {
        SystemConflict::new(id, ConflictType::BudgetRisk, ConflictSeverity::Warning, "Budget krap", "Verhoog budget")
    }

    fn guidance() -> AnticipationGuidance {
        AnticipationGuidance {
            id: "g".to_string(),
            priority: AnticipationPriority::High,
            chapter: Chapter::Budget,
            question: "Wat is je budget?".to_string(),
            reasoning: "ontbreekt".to_string(),
            related_fields: vec![],
        }
    }

    mod history_window {
        use super::*;

        #[test]
        fn default_goal_keeps_three_newest_oldest_first() {
            let pruned = ContextPruner::default().prune(&context(TurnGoal::Advies).with_history(history(6)));

            let texts: Vec<_> = pruned.history.iter().map(|t| t.text.as_str()).collect();
            assert_eq!(texts, vec!["bericht 3", "bericht 4", "bericht 5"]);
            assert!(pruned.prune_log.iter().any(|r| r.contains("history window")));
        }

        #[test]
        fn probe_goal_keeps_two_turns_and_guidance() {
            let pruned = ContextPruner::default().prune(
                &context(TurnGoal::Probe)
                    .with_history(history(5))
                    .with_anticipation(Some(guidance())),
            );

            assert_eq!(pruned.history.len(), 2);
            assert_eq!(pruned.history[1].text, "bericht 4");
            assert!(pruned.anticipation.is_some());
        }

        #[test]
        fn short_history_is_kept_whole() {
            let pruned = ContextPruner::default().prune(&context(TurnGoal::Advies).with_history(history(2)));
            assert_eq!(pruned.history.len(), 2);
        }
    }

    mod goal_rules {
        use super::*;

        fn knowledge() -> (Vec<KnowledgeNugget>, Vec<CustomerExample>) {
            let nuggets = (0..5)
                .map(|i| KnowledgeNugget::new(format!("n{}", i), "titel", "inhoud", i as f64 / 10.0))
                .collect();
            let examples = (0..4)
                .map(|i| CustomerExample::new(format!("e{}", i), "voorbeeld", i as f64))
                .collect();
            (nuggets, examples)
        }

        #[test]
        fn patch_goal_keeps_top_ranked_knowledge() {
            let (nuggets, examples) = knowledge();
            let pruned = ContextPruner::default()
                .prune(&context(TurnGoal::Patch).with_knowledge(nuggets, examples));

            let ids: Vec<_> = pruned.kb_nuggets.iter().map(|n| n.id.as_str()).collect();
            assert_eq!(ids, vec!["n4", "n3", "n2"]);
            let ids: Vec<_> = pruned.customer_examples.iter().map(|e| e.id.as_str()).collect();
            assert_eq!(ids, vec!["e3", "e2"]);
        }

        #[test]
        fn conflict_goal_includes_all_conflicts_and_no_knowledge() {
            let (nuggets, examples) = knowledge();
            let conflicts: Vec<_> = (0..6).map(|i| conflict(&format!("c{}", i))).collect();

            let pruned = ContextPruner::default().prune(
                &context(TurnGoal::ConflictResolution)
                    .with_conflicts(conflicts)
                    .with_knowledge(nuggets, examples),
            );

            assert_eq!(pruned.conflicts.len(), 6);
            assert!(pruned.kb_nuggets.is_empty());
            assert!(pruned.customer_examples.is_empty());
            assert!(pruned.prune_log.iter().any(|r| r.contains("knowledge")));
        }

        #[test]
        fn advies_goal_omits_conflicts_and_guidance() {
            let pruned = ContextPruner::default().prune(
                &context(TurnGoal::Advies)
                    .with_conflicts(vec![conflict("c")])
                    .with_anticipation(Some(guidance())),
            );

            assert!(pruned.conflicts.is_empty());
            assert!(pruned.anticipation.is_none());
            assert_eq!(pruned.prune_log.len(), 2);
        }

        #[test]
        fn plan_payload_is_not_duplicated() {
            let full_plan = plan(TurnGoal::ConflictResolution).with_conflicts(vec![conflict("c")]);
            let full = FullContext::new(state(), full_plan, BehaviorProfile::default());

            let pruned = ContextPruner::default().prune(&full);

            assert!(pruned.plan.conflicts.is_empty());
            assert_eq!(pruned.plan.goal, TurnGoal::ConflictResolution);
        }
    }

    mod budget {
        use super::*;

        #[test]
        fn all_answered_chapters_fit_small_state() {
            let pruned = ContextPruner::default().prune(&context(TurnGoal::Advies));

            assert_eq!(pruned.chapter_answers.len(), 3);
            assert!(pruned.token_estimate < 4000);
            assert!(!pruned.was_pruned());
        }

        #[test]
        fn focused_field_implies_focused_chapter() {
            let pruned = ContextPruner::default().prune(
                &context(TurnGoal::Advies).with_focus(None, Some("ruimtes.rooms".to_string())),
            );

            assert_eq!(pruned.focused_chapter, Some(Chapter::Ruimtes));
            assert!(pruned.includes_chapter(Chapter::Ruimtes));
        }

        #[test]
        fn oversized_focused_chapter_drops_everything_else() {
            let big = "x".repeat(20_000);
            let full = FullContext::new(
                state().with_chapter(Chapter::Ruimtes, json!({ "notes": big })),
                plan(TurnGoal::Probe),
                BehaviorProfile::default(),
            )
            .with_history(history(3))
            .with_anticipation(Some(guidance()))
            .with_focus(Some(Chapter::Ruimtes), None);

            let pruned = ContextPruner::default().prune(&full);

            assert!(pruned.token_estimate >= 4000);
            assert_eq!(pruned.chapter_answers.len(), 1);
            assert!(pruned.includes_chapter(Chapter::Ruimtes));
            assert!(pruned.history.is_empty());
            assert!(pruned.anticipation.is_none());
            assert_eq!(pruned.prune_log.len(), 1);
        }

        #[test]
        fn large_chapters_are_dropped_to_stay_under_ceiling() {
            let mut state = WizardState::new();
            for chapter in Chapter::all() {
                state = state.with_chapter(*chapter, json!({ "notes": "y".repeat(4_000) }));
            }
            let full = FullContext::new(state, plan(TurnGoal::Advies), BehaviorProfile::default());

            let pruned = ContextPruner::default().prune(&full);

            assert!(pruned.token_estimate < 4000);
            assert!(pruned.chapter_answers.len() < Chapter::all().len());
            assert!(pruned.prune_log.iter().any(|r| r.contains("budget exhausted")));
        }

        #[test]
        fn large_input_prunes_quickly() {
            let nuggets: Vec<_> = (0..60)
                .map(|i| KnowledgeNugget::new(format!("n{}", i), "t", "c".repeat(500), (i % 7) as f64))
                .collect();
            let examples: Vec<_> = (0..40)
                .map(|i| CustomerExample::new(format!("e{}", i), "s".repeat(300), i as f64))
                .collect();
            let full = context(TurnGoal::Patch)
                .with_history(history(80))
                .with_knowledge(nuggets, examples);

            let started = Instant::now();
            let pruned = ContextPruner::default().prune(&full);

            assert!(started.elapsed().as_millis() < 100);
            assert!(pruned.token_estimate < 4000);
        }

        #[test]
        fn pruning_is_deterministic() {
            let full = context(TurnGoal::Patch).with_history(history(10));
            let pruner = ContextPruner::default();
            assert_eq!(pruner.prune(&full), pruner.prune(&full));
        }
    }

    fn arb_goal() -> impl Strategy<Value = TurnGoal> {
        prop_oneof![
            Just(TurnGoal::Advies),
            Just(TurnGoal::Probe),
            Just(TurnGoal::Patch),
            Just(TurnGoal::FillData),
            Just(TurnGoal::ConflictResolution),
            Just(TurnGoal::SurfaceRisks),
            Just(TurnGoal::Clarify),
        ]
    }

    fn arb_chapter() -> impl Strategy<Value = Chapter> {
        (0..Chapter::all().len()).prop_map(|i| Chapter::all()[i])
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn estimate_stays_below_ceiling_unless_focus_is_oversized(
            goal in arb_goal(),
            chapter_sizes in prop::collection::vec(0usize..6_000, 7),
            turns in prop::collection::vec(".{0,400}", 0..30),
            nugget_sizes in prop::collection::vec(0usize..2_000, 0..20),
            conflict_count in 0usize..5,
            focus in prop::option::of(arb_chapter()),
        ) {
            let mut state = WizardState::new();
            for (chapter, size) in Chapter::all().iter().zip(&chapter_sizes) {
                state = state.with_chapter(*chapter, json!({ "notes": "a".repeat(*size) }));
            }
            let nuggets = nugget_sizes
                .iter()
                .enumerate()
                .map(|(i, size)| KnowledgeNugget::new(format!("n{}", i), "t", "b".repeat(*size), i as f64))
                .collect();
            let full = FullContext::new(state, plan(goal), BehaviorProfile::default())
                .with_history(turns.into_iter().map(ConversationTurn::user).collect())
                .with_conflicts((0..conflict_count).map(|i| conflict(&format!("c{}", i))).collect())
                .with_anticipation(Some(guidance()))
                .with_knowledge(nuggets, vec![])
                .with_focus(focus, None);

            let pruned = ContextPruner::default().prune(&full);

            if let Some(chapter) = focus {
                prop_assert!(pruned.includes_chapter(chapter));
            }
            if pruned.token_estimate >= 4000 {
                prop_assert!(focus.is_some());
                prop_assert_eq!(pruned.chapter_answers.len(), 1);
                prop_assert!(pruned.history.is_empty());
                prop_assert!(pruned.kb_nuggets.is_empty());
                prop_assert!(pruned.conflicts.is_empty());
            }
            prop_assert!(pruned.history.len() <= 3);
            prop_assert!(pruned.kb_nuggets.len() <= 3);
        }
    }
}
