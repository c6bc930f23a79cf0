//! Rule-based conflict detection over wizard state.

use crate::domain::foundation::Chapter;
use crate::domain::wizard::WizardState;

use super::system_conflict::{ConflictSeverity, ConflictType, SystemConflict};

/// Budget below this share of the estimated cost is a blocking conflict.
const BLOCKING_BUDGET_RATIO: f64 = 0.7;

/// Default number of building layers when `basis.bouwlagen` is absent.
const DEFAULT_FLOORS: f64 = 2.0;

/// Minimum budget (euro) considered realistic for an energy-neutral or
/// passive building ambition.
pub const AMBITION_BUDGET_FLOOR: f64 = 250_000.0;

const HIGH_AMBITION_MARKERS: &[&str] = &["energieneutraal", "nul op de meter", "passief"];

/// Detects inconsistencies in wizard state.
///
/// Implementations must treat missing data as unknown and never fail.
pub trait ConflictDetector: Send + Sync {
    fn detect(&self, state: &WizardState) -> Vec<SystemConflict>;
}

/// Detector based on rough cost and area arithmetic.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedConflictDetector;

impl RuleBasedConflictDetector {
    pub fn new() -> Self {
        Self
    }

    fn budget_risk(&self, state: &WizardState) -> Option<SystemConflict> {
        let budget = state.number("budget.budgetTotaal")?;
        let area = state.total_room_area()?;
        let project_type = state.project_type();
        let estimate = area * project_type.cost_per_m2();

        if budget >= estimate {
            return None;
        }

        let severity = if budget < estimate * BLOCKING_BUDGET_RATIO {
            ConflictSeverity::Blocking
        } else {
            ConflictSeverity::Warning
        };

        Some(
            SystemConflict::new(
                "conflict-budget-risk",
                ConflictType::BudgetRisk,
                severity,
                format!(
                    "Je budget van {} ligt onder de geschatte bouwkosten van {} voor {:.0} m².",
                    format_euro(budget),
                    format_euro(estimate),
                    area
                ),
                "Verlaag het aantal vierkante meters, kies eenvoudigere afwerking of verhoog het budget.",
            )
            .with_fields(&["budget.budgetTotaal", "ruimtes.rooms"])
            .with_chapters(&[Chapter::Budget, Chapter::Ruimtes])
            .with_estimated_cost(estimate),
        )
    }

    fn physical_constraint(&self, state: &WizardState) -> Option<SystemConflict> {
        let plot = state.number("basis.perceelOppervlakte")?;
        let area = state.total_room_area()?;
        let floors = state
            .number("basis.bouwlagen")
            .filter(|f| *f > 0.0)
            .unwrap_or(DEFAULT_FLOORS);
        let capacity = plot * floors;

        if area <= capacity {
            return None;
        }

        Some(
            SystemConflict::new(
                "conflict-physical-constraint",
                ConflictType::PhysicalConstraint,
                ConflictSeverity::Warning,
                format!(
                    "De ruimtes beslaan samen {:.0} m², terwijl het perceel bij {:.0} bouwlagen ruimte biedt voor ongeveer {:.0} m².",
                    area, floors, capacity
                ),
                "Controleer de oppervlaktes per ruimte of overweeg een extra bouwlaag.",
            )
            .with_fields(&["basis.perceelOppervlakte", "basis.bouwlagen", "ruimtes.rooms"])
            .with_chapters(&[Chapter::Basis, Chapter::Ruimtes]),
        )
    }

    fn ambition_mismatch(&self, state: &WizardState) -> Option<SystemConflict> {
        let ambition = state.text("duurzaam.ambitie")?.to_lowercase();
        let budget = state.number("budget.budgetTotaal")?;

        let high_ambition = HIGH_AMBITION_MARKERS.iter().any(|m| ambition.contains(m))
            || ambition.split(|c: char| !c.is_alphanumeric()).any(|w| w == "nom");
        if !high_ambition || budget >= AMBITION_BUDGET_FLOOR {
            return None;
        }

        Some(
            SystemConflict::new(
                "conflict-ambition-mismatch",
                ConflictType::AmbitionMismatch,
                ConflictSeverity::Warning,
                format!(
                    "Een {} woning vraagt meestal meer dan {} aan budget.",
                    ambition,
                    format_euro(budget)
                ),
                "Kies een stapsgewijze duurzaamheidsambitie of reserveer extra budget voor installaties en isolatie.",
            )
            .with_fields(&["duurzaam.ambitie", "budget.budgetTotaal"])
            .with_chapters(&[Chapter::Duurzaam, Chapter::Budget]),
        )
    }
}

impl ConflictDetector for RuleBasedConflictDetector {
    fn detect(&self, state: &WizardState) -> Vec<SystemConflict> {
        let conflicts: Vec<SystemConflict> = [
            self.budget_risk(state),
            self.physical_constraint(state),
            self.ambition_mismatch(state),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !conflicts.is_empty() {
            tracing::debug!(count = conflicts.len(), "Detected system conflicts");
        }
        conflicts
    }
}

/// Formats an amount as Dutch euro notation, e.g. `€ 264.000`.
fn format_euro(amount: f64) -> String {
    let rounded = amount.round().max(0.0) as u64;
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("€ {}", grouped)
}
