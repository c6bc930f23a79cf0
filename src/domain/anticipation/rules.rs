//! The anticipation rule table.
//!
//! Rules are data: each record names where it applies and a [`Condition`]
//! evaluated uniformly against wizard state. Declaration order is the
//! tie-break order.

use serde_json::Value;

use super::guidance::AnticipationPriority;
use crate::domain::foundation::Chapter;
use crate::domain::wizard::{ProjectType, WizardState};

/// Predicate over wizard state. Absent fields are unknown, never an error.
#[derive(Debug, Clone, Copy)]
pub enum Condition {
    /// Field is absent or empty.
    Missing(&'static str),
    /// Field holds a non-empty value.
    Present(&'static str),
    /// Any text under the field contains one of the needles (case-insensitive).
    TextContainsAny {
        path: &'static str,
        needles: &'static [&'static str],
    },
    /// Some array item has `key` equal to `value` (case-insensitive).
    ArrayItemEquals {
        path: &'static str,
        key: &'static str,
        value: &'static str,
    },
    /// Lifestyle flag under `basis.leefstijl` is set.
    LifestyleFlag(&'static str),
    All(&'static [Condition]),
}

impl Condition {
    pub fn holds(&self, state: &WizardState) -> bool {
        match self {
            Condition::Missing(path) => !state.has_value(path),
            Condition::Present(path) => state.has_value(path),
            Condition::TextContainsAny { path, needles } => state.field(path).is_some_and(|v| {
                let mut texts = Vec::new();
                collect_text(v, &mut texts);
                texts.iter().any(|t| needles.iter().any(|n| t.contains(n)))
            }),
            Condition::ArrayItemEquals { path, key, value } => state
                .field(path)
                .and_then(Value::as_array)
                .is_some_and(|items| {
                    items.iter().any(|item| {
                        item.get(*key)
                            .and_then(Value::as_str)
                            .is_some_and(|s| s.trim().eq_ignore_ascii_case(value))
                    })
                }),
            Condition::LifestyleFlag(flag) => lifestyle_flag(state, flag),
            Condition::All(conditions) => conditions.iter().all(|c| c.holds(state)),
        }
    }
}

/// Declarative proactive-guidance rule.
#[derive(Debug, Clone, Copy)]
pub struct AnticipationRule {
    pub id: &'static str,
    pub chapters: &'static [Chapter],
    /// Empty means every project type.
    pub project_types: &'static [ProjectType],
    pub priority: AnticipationPriority,
    pub condition: Condition,
    /// Chapter the question belongs to.
    pub target: Chapter,
    pub question: &'static str,
    pub reasoning: &'static str,
    pub related_fields: &'static [&'static str],
}

impl AnticipationRule {
    pub fn applies_to(&self, chapter: Chapter, project_type: ProjectType) -> bool {
        self.chapters.contains(&chapter)
            && (self.project_types.is_empty() || self.project_types.contains(&project_type))
    }
}

fn collect_text(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.to_lowercase()),
        Value::Array(items) => items.iter().for_each(|v| collect_text(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_text(v, out)),
        _ => {}
    }
}

fn lifestyle_flag(state: &WizardState, flag: &str) -> bool {
    match state.field("basis.leefstijl") {
        Some(Value::Object(map)) => map.get(flag).is_some_and(is_truthy),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .any(|s| s.trim().eq_ignore_ascii_case(flag)),
        _ => false,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f > 0.0),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "ja" | "true" | "yes" | "1"),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

const STRUCTURAL_MARKERS: &[&str] = &[
    "draagmuur",
    "dragende muur",
    "fundering",
    "asbest",
    "scheur",
    "verzakking",
    "constructie",
    "doorbraak",
];

/// Built-in rules in tie-break order.
pub const DEFAULT_RULES: &[AnticipationRule] = &[
    AnticipationRule {
        id: "structural_risk_rooms",
        chapters: &[Chapter::Ruimtes, Chapter::Risico],
        project_types: &[],
        priority: AnticipationPriority::Critical,
        condition: Condition::TextContainsAny {
            path: "ruimtes.rooms",
            needles: STRUCTURAL_MARKERS,
        },
        target: Chapter::Risico,
        question: "Je noemt ingrepen die de constructie raken, zoals een draagmuur of de fundering. Is er al een constructeur betrokken, en weet je of er asbest aanwezig kan zijn?",
        reasoning: "Constructieve ingrepen en mogelijk asbest zijn veiligheidsrisico's die vóór het ontwerp duidelijk moeten zijn.",
        related_fields: &["ruimtes.rooms", "risico.constructeur", "risico.asbest"],
    },
    AnticipationRule {
        id: "must_have_without_budget",
        chapters: &[Chapter::Wensen, Chapter::Budget],
        project_types: &[],
        priority: AnticipationPriority::High,
        condition: Condition::All(&[
            Condition::ArrayItemEquals {
                path: "wensen.wishes",
                key: "priority",
                value: "must",
            },
            Condition::Missing("budget.budgetTotaal"),
        ]),
        target: Chapter::Budget,
        question: "Je hebt een aantal must-haves genoemd. Welk totaalbudget heb je ongeveer in gedachten, zodat we kunnen kijken of die wensen haalbaar zijn?",
        reasoning: "Must-have wensen zonder budget maken het onmogelijk om haalbaarheid te toetsen.",
        related_fields: &["wensen.wishes", "budget.budgetTotaal"],
    },
    AnticipationRule {
        id: "renovation_building_year",
        chapters: &[Chapter::Basis, Chapter::Risico],
        project_types: &[ProjectType::Verbouw, ProjectType::Renovatie],
        priority: AnticipationPriority::High,
        condition: Condition::Missing("basis.bouwjaar"),
        target: Chapter::Basis,
        question: "Uit welk jaar stamt de woning ongeveer? Dat zegt veel over isolatie, fundering en mogelijke asbest.",
        reasoning: "Bij verbouw of renovatie bepaalt het bouwjaar de belangrijkste technische risico's.",
        related_fields: &["basis.bouwjaar"],
    },
    AnticipationRule {
        id: "new_build_sustainability",
        chapters: &[Chapter::Basis, Chapter::Wensen, Chapter::Duurzaam],
        project_types: &[ProjectType::Nieuwbouw],
        priority: AnticipationPriority::Medium,
        condition: Condition::Missing("duurzaam.ambitie"),
        target: Chapter::Duurzaam,
        question: "Bij nieuwbouw is dit hét moment om duurzaamheid mee te nemen. Wil je bijvoorbeeld energieneutraal bouwen, of eerst voldoen aan de wettelijke eisen?",
        reasoning: "Duurzaamheidskeuzes zijn bij nieuwbouw vroeg in het ontwerp het goedkoopst.",
        related_fields: &["duurzaam.ambitie"],
    },
    AnticipationRule {
        id: "lifestyle_children",
        chapters: &[Chapter::Ruimtes],
        project_types: &[],
        priority: AnticipationPriority::Medium,
        condition: Condition::LifestyleFlag("kinderen"),
        target: Chapter::Ruimtes,
        question: "Met kinderen in huis: wil je een aparte speelruimte, of liever zicht op spelende kinderen vanuit de keuken?",
        reasoning: "Gezinnen met kinderen hebben vaak specifieke wensen voor speelruimte en zichtlijnen.",
        related_fields: &["basis.leefstijl.kinderen", "ruimtes.rooms"],
    },
    AnticipationRule {
        id: "lifestyle_work_from_home",
        chapters: &[Chapter::Ruimtes],
        project_types: &[],
        priority: AnticipationPriority::Medium,
        condition: Condition::LifestyleFlag("thuiswerken"),
        target: Chapter::Ruimtes,
        question: "Je werkt thuis. Heb je een afsluitbare werkplek nodig, en hoeveel dagen per week werk je daar?",
        reasoning: "Thuiswerken vraagt om een rustige werkplek met goede akoestiek en daglicht.",
        related_fields: &["basis.leefstijl.thuiswerken", "ruimtes.rooms"],
    },
    AnticipationRule {
        id: "lifestyle_active_cooking",
        chapters: &[Chapter::Ruimtes],
        project_types: &[],
        priority: AnticipationPriority::Medium,
        condition: Condition::LifestyleFlag("kooktVeel"),
        target: Chapter::Ruimtes,
        question: "Je kookt graag. Denk je aan een kookeiland, extra werkruimte of een bijkeuken?",
        reasoning: "Actieve koks hebben baat bij een ruimere keukenindeling en goede afzuiging.",
        related_fields: &["basis.leefstijl.kooktVeel", "ruimtes.rooms"],
    },
    AnticipationRule {
        id: "heating_unknown",
        chapters: &[Chapter::Techniek],
        project_types: &[],
        priority: AnticipationPriority::Medium,
        condition: Condition::Missing("techniek.verwarming"),
        target: Chapter::Techniek,
        question: "Hoe wil je de woning verwarmen? Denk aan een warmtepomp, hybride systeem of (voorlopig) een cv-ketel.",
        reasoning: "Het verwarmingssysteem bepaalt mede de isolatie-eisen en de installatieruimte.",
        related_fields: &["techniek.verwarming"],
    },
];
