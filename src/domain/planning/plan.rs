//! Turn plan value types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::anticipation::AnticipationGuidance;
use crate::domain::behavior::Tone;
use crate::domain::conflict::SystemConflict;

/// What the assistant sets out to do this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnGoal {
    Clarify,
    FillData,
    AnticipateAndGuide,
    SurfaceRisks,
    OfferAlternatives,
    ConflictResolution,
    Advies,
    Probe,
    Patch,
}

impl TurnGoal {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Clarify => "clarify",
            Self::FillData => "fill_data",
            Self::AnticipateAndGuide => "anticipate_and_guide",
            Self::SurfaceRisks => "surface_risks",
            Self::OfferAlternatives => "offer_alternatives",
            Self::ConflictResolution => "conflict_resolution",
            Self::Advies => "advies",
            Self::Probe => "probe",
            Self::Patch => "patch",
        }
    }

    /// Goals that ask the model for structured patches.
    pub fn is_data_entry(&self) -> bool {
        matches!(self, Self::Patch | Self::FillData)
    }

    /// Goals driven by detected conflicts.
    pub fn is_conflict_driven(&self) -> bool {
        matches!(self, Self::ConflictResolution | Self::SurfaceRisks)
    }

    /// Goals driven by proactive guidance.
    pub fn is_anticipation_driven(&self) -> bool {
        matches!(self, Self::Probe | Self::AnticipateAndGuide)
    }

    /// Whether turns with this goal may change wizard data. Only data-entry
    /// turns ask the model for patches.
    pub fn allows_patches(&self) -> bool {
        self.is_data_entry()
    }
}

impl fmt::Display for TurnGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which signal won the arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPriority {
    SystemConflict,
    Anticipation,
    UserQuery,
}

/// Whether model output must pass the patch guard before it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    GuardRequired,
    Normal,
}

/// The arbitration result for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnPlan {
    pub goal: TurnGoal,
    pub tone: Tone,
    pub priority: TurnPriority,
    pub route: Route,
    pub allow_patches: bool,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<SystemConflict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anticipation: Option<AnticipationGuidance>,
}

impl TurnPlan {
    /// Plan with no triggering conflicts or guidance.
    pub fn new(
        goal: TurnGoal,
        tone: Tone,
        priority: TurnPriority,
        route: Route,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            goal,
            tone,
            priority,
            route,
            allow_patches: goal.allows_patches(),
            reasoning: reasoning.into(),
            conflicts: Vec::new(),
            anticipation: None,
        }
    }

    pub fn with_conflicts(mut self, conflicts: Vec<SystemConflict>) -> Self {
        self.conflicts = conflicts;
        self
    }

    pub fn with_anticipation(mut self, guidance: AnticipationGuidance) -> Self {
        self.anticipation = Some(guidance);
        self
    }

    /// Compact description of the plan included in every model context.
    pub fn essentials(&self) -> String {
        format!(
            "goal={} tone={} route={} patches={}",
            self.goal,
            self.tone,
            match self.route {
                Route::GuardRequired => "guard_required",
                Route::Normal => "normal",
            },
            self.allow_patches
        )
    }
}

impl Default for TurnPlan {
    fn default() -> Self {
        Self::new(
            TurnGoal::Advies,
            Tone::Neutral,
            TurnPriority::UserQuery,
            Route::Normal,
            "No signal present; answering as advice",
        )
    }
}
