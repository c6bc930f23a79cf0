//! Chapter enum representing the seven fixed wizard sections.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors raised when a raw chapter key cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChapterError {
    #[error("Unknown chapter key: '{0}'")]
    Unknown(String),
}

/// The seven wizard chapters, in the order the wizard presents them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chapter {
    Basis,
    Ruimtes,
    Wensen,
    Budget,
    Techniek,
    Duurzaam,
    Risico,
}

impl Chapter {
    /// Returns all chapters in wizard order.
    pub fn all() -> &'static [Chapter] {
        &[
            Chapter::Basis,
            Chapter::Ruimtes,
            Chapter::Wensen,
            Chapter::Budget,
            Chapter::Techniek,
            Chapter::Duurzaam,
            Chapter::Risico,
        ]
    }

    /// Returns the wire key used in wizard state and patches.
    pub fn key(&self) -> &'static str {
        match self {
            Chapter::Basis => "basis",
            Chapter::Ruimtes => "ruimtes",
            Chapter::Wensen => "wensen",
            Chapter::Budget => "budget",
            Chapter::Techniek => "techniek",
            Chapter::Duurzaam => "duurzaam",
            Chapter::Risico => "risico",
        }
    }

    /// Returns the Dutch display name shown to the user.
    pub fn display_name(&self) -> &'static str {
        match self {
            Chapter::Basis => "Basis",
            Chapter::Ruimtes => "Ruimtes",
            Chapter::Wensen => "Wensen",
            Chapter::Budget => "Budget",
            Chapter::Techniek => "Techniek",
            Chapter::Duurzaam => "Duurzaamheid",
            Chapter::Risico => "Risico's",
        }
    }

    /// Returns the 0-based position of this chapter in the wizard.
    pub fn order_index(&self) -> usize {
        Self::all().iter().position(|c| c == self).unwrap_or(0)
    }
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Chapter {
    type Err = ChapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Chapter::all()
            .iter()
            .copied()
            .find(|c| c.key() == normalized)
            .ok_or_else(|| ChapterError::Unknown(s.to_string()))
    }
}
