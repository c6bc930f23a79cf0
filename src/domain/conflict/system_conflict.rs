//! Conflict value types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::Chapter;

/// Category of a detected inconsistency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    BudgetRisk,
    PhysicalConstraint,
    AmbitionMismatch,
}

impl ConflictType {
    pub fn key(&self) -> &'static str {
        match self {
            Self::BudgetRisk => "budget_risk",
            Self::PhysicalConstraint => "physical_constraint",
            Self::AmbitionMismatch => "ambition_mismatch",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// How urgently a conflict must be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    /// Must be resolved before data entry continues.
    Blocking,
    Warning,
}

impl ConflictSeverity {
    /// Sort rank, lower first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Blocking => 0,
            Self::Warning => 1,
        }
    }
}

impl fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocking => write!(f, "blocking"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A detected inconsistency in project state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConflict {
    pub id: String,
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub severity: ConflictSeverity,
    pub description: String,
    #[serde(default)]
    pub affected_fields: Vec<String>,
    #[serde(default)]
    pub affected_chapters: Vec<Chapter>,
    pub resolution_hint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
}

impl SystemConflict {
    pub fn new(
        id: impl Into<String>,
        conflict_type: ConflictType,
        severity: ConflictSeverity,
        description: impl Into<String>,
        resolution_hint: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            conflict_type,
            severity,
            description: description.into(),
            affected_fields: Vec::new(),
            affected_chapters: Vec::new(),
            resolution_hint: resolution_hint.into(),
            estimated_cost: None,
        }
    }

    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.affected_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_chapters(mut self, chapters: &[Chapter]) -> Self {
        self.affected_chapters = chapters.to_vec();
        self
    }

    pub fn with_estimated_cost(mut self, cost: f64) -> Self {
        self.estimated_cost = Some(cost);
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == ConflictSeverity::Blocking
    }

    /// Rough serialized size used for token budgeting.
    pub fn estimate_tokens(&self) -> u32 {
        let chars = self.description.chars().count()
            + self.resolution_hint.chars().count()
            + self.affected_fields.iter().map(|f| f.len()).sum::<usize>()
            + 48;
        chars.div_ceil(4) as u32
    }
}
