//! Priority-matrix planner.

use once_cell::sync::Lazy;
use regex::Regex;

use super::plan::{Route, TurnGoal, TurnPlan, TurnPriority};
use crate::domain::anticipation::{AnticipationGuidance, AnticipationPriority};
use crate::domain::behavior::{BehaviorProfile, ConfidenceLevel, Tone};
use crate::domain::conflict::{ConflictSeverity, SystemConflict};

static ADVICE_SEEKING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(advies|adviseer|raad je aan|aanraden|wat vind je|wat zou jij|tips?\b|is het slim|is het verstandig|wat kost|hoeveel kost)",
    )
    .expect("advice pattern must compile")
});

static QUESTION_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(wat|hoe|waarom|welke?|wanneer|waar|wie|kan|kun|kunnen|moet|moeten|mag|is|zijn|heb|hebben|zou|wil je)\b",
    )
    .expect("question pattern must compile")
});

static DATA_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d[\d.,]*\s?(m2|m²|m3|euro|k\b|%|kamers?|slaapkamers?|personen|bouwlagen)|€\s?\d|\b(we willen|wij willen|ik wil|we hebben|wij hebben|ik heb|ons budget|mijn budget|het budget is|we gaan voor|het wordt|we kiezen|ik kies|bouwjaar)\b)",
    )
    .expect("data pattern must compile")
});

/// Combines behavior, conflicts, guidance and the message into a [`TurnPlan`].
///
/// Rules are evaluated top to bottom and the first match wins:
/// blocking conflict, critical guidance, warning conflict, high guidance,
/// then the message intent.
#[derive(Debug, Clone, Default)]
pub struct TurnPlanner;

impl TurnPlanner {
    pub fn new() -> Self {
        Self
    }

    pub fn plan(
        &self,
        behavior: Option<&BehaviorProfile>,
        conflicts: &[SystemConflict],
        anticipation: Option<&AnticipationGuidance>,
        message: &str,
    ) -> TurnPlan {
        let tone = behavior.map(|b| b.tone_hint).unwrap_or(Tone::Neutral);
        let blocking = conflicts.iter().filter(|c| c.is_blocking()).count();

        let plan = if blocking > 0 {
            let overwhelmed = behavior.is_some_and(|b| b.overwhelmed);
            TurnPlan::new(
                TurnGoal::ConflictResolution,
                if overwhelmed { Tone::Warm } else { tone },
                TurnPriority::SystemConflict,
                Route::GuardRequired,
                format!(
                    "{} blocking conflict(s) must be resolved before continuing: {}",
                    blocking,
                    conflict_summary(conflicts)
                ),
            )
            .with_conflicts(sorted_blocking_first(conflicts))
        } else if let Some(guidance) = anticipation.filter(|g| g.priority == AnticipationPriority::Critical) {
            probe_plan(tone, guidance)
        } else if !conflicts.is_empty() {
            TurnPlan::new(
                TurnGoal::ConflictResolution,
                tone,
                TurnPriority::SystemConflict,
                Route::GuardRequired,
                format!(
                    "{} warning conflict(s) need attention: {}",
                    conflicts.len(),
                    conflict_summary(conflicts)
                ),
            )
            .with_conflicts(sorted_blocking_first(conflicts))
        } else if let Some(guidance) = anticipation.filter(|g| g.priority == AnticipationPriority::High) {
            probe_plan(tone, guidance)
        } else {
            intent_plan(behavior, tone, message)
        };

        tracing::debug!(
            goal = %plan.goal,
            priority = ?plan.priority,
            tone = %plan.tone,
            "Planned turn"
        );
        plan
    }
}

fn probe_plan(tone: Tone, guidance: &AnticipationGuidance) -> TurnPlan {
    TurnPlan::new(
        TurnGoal::Probe,
        tone,
        TurnPriority::Anticipation,
        Route::Normal,
        format!(
            "{} anticipation '{}' for {} takes precedence over the user query",
            guidance.priority, guidance.id, guidance.chapter
        ),
    )
    .with_anticipation(guidance.clone())
}

fn intent_plan(behavior: Option<&BehaviorProfile>, tone: Tone, message: &str) -> TurnPlan {
    let message = message.trim();
    if message.is_empty() {
        return TurnPlan::new(
            TurnGoal::Advies,
            tone,
            TurnPriority::UserQuery,
            Route::Normal,
            "Empty message; defaulting to advice",
        );
    }

    let advice_seeking = ADVICE_SEEKING.is_match(message);
    let question = message.contains('?') || QUESTION_START.is_match(message);
    let states_data = DATA_STATEMENT.is_match(message);
    let decisive = behavior.is_some_and(|b| b.confidence_level == ConfidenceLevel::High);

    if !advice_seeking && (states_data || (decisive && !question)) {
        TurnPlan::new(
            TurnGoal::Patch,
            tone,
            TurnPriority::UserQuery,
            Route::GuardRequired,
            "Message states concrete project data",
        )
    } else if advice_seeking || question {
        TurnPlan::new(
            TurnGoal::Advies,
            tone,
            TurnPriority::UserQuery,
            Route::Normal,
            "Message asks a question or seeks advice",
        )
    } else {
        TurnPlan::new(
            TurnGoal::Advies,
            tone,
            TurnPriority::UserQuery,
            Route::Normal,
            "No specific intent detected; defaulting to advice",
        )
    }
}

/// Blocking first, input order preserved within each severity.
fn sorted_blocking_first(conflicts: &[SystemConflict]) -> Vec<SystemConflict> {
    let mut sorted = conflicts.to_vec();
    sorted.sort_by_key(|c| c.severity.rank());
    sorted
}

fn conflict_summary(conflicts: &[SystemConflict]) -> String {
    conflicts
        .iter()
        .map(|c| match c.severity {
            ConflictSeverity::Blocking => format!("{} (blocking)", c.conflict_type),
            ConflictSeverity::Warning => format!("{} (warning)", c.conflict_type),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
