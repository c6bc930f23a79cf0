//! Patch representation and validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{Chapter, ChapterError};

/// Mutation applied at a path inside a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOperation {
    /// Replace whatever is at the path.
    Set,
    /// Numeric addition, or set-like insert into an array.
    Add,
    /// Push onto an array, or extend a text value.
    Append,
}

/// The change carried by a patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchDelta {
    /// Dotted path relative to the chapter root (e.g. `budgetTotaal`).
    pub path: String,
    pub operation: PatchOperation,
    pub value: Value,
}

impl PatchDelta {
    pub fn new(path: impl Into<String>, operation: PatchOperation, value: Value) -> Self {
        Self {
            path: path.into(),
            operation,
            value,
        }
    }
}

/// A validated patch addressed to one of the known chapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub chapter: Chapter,
    pub delta: PatchDelta,
}

impl Patch {
    /// Creates a `set` patch.
    pub fn set(chapter: Chapter, path: impl Into<String>, value: Value) -> Self {
        Self {
            chapter,
            delta: PatchDelta::new(path, PatchOperation::Set, value),
        }
    }

    /// Creates an `add` patch.
    pub fn add(chapter: Chapter, path: impl Into<String>, value: Value) -> Self {
        Self {
            chapter,
            delta: PatchDelta::new(path, PatchOperation::Add, value),
        }
    }

    /// Creates an `append` patch.
    pub fn append(chapter: Chapter, path: impl Into<String>, value: Value) -> Self {
        Self {
            chapter,
            delta: PatchDelta::new(path, PatchOperation::Append, value),
        }
    }

    /// Full field path including the chapter key.
    pub fn field_path(&self) -> String {
        format!("{}.{}", self.chapter.key(), self.delta.path)
    }
}

/// A patch as returned by the language model, before chapter validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedPatch {
    pub chapter: String,
    pub delta: PatchDelta,
}

impl ProposedPatch {
    pub fn new(chapter: impl Into<String>, delta: PatchDelta) -> Self {
        Self {
            chapter: chapter.into(),
            delta,
        }
    }

    /// Resolves the chapter key, rejecting anything outside the seven chapters.
    pub fn validate(self) -> Result<Patch, ChapterError> {
        let chapter = self.chapter.parse::<Chapter>()?;
        Ok(Patch {
            chapter,
            delta: self.delta,
        })
    }
}

/// Errors raised when a patch cannot be applied to the wizard state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("Patch path is empty")]
    EmptyPath,

    #[error("Cannot descend into non-container value at '{path}'")]
    NotAContainer { path: String },

    #[error("Invalid array index '{segment}' in '{path}'")]
    InvalidIndex { path: String, segment: String },

    #[error("Operation {operation:?} is incompatible with the value at '{path}'")]
    IncompatibleOperation {
        path: String,
        operation: PatchOperation,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn proposed_patch_with_known_chapter_validates() {
        let proposed = ProposedPatch::new(
            "budget",
            PatchDelta::new("budgetTotaal", PatchOperation::Set, json!(250000)),
        );

        let patch = proposed.validate().unwrap();

        assert_eq!(patch.chapter, Chapter::Budget);
        assert_eq!(patch.field_path(), "budget.budgetTotaal");
    }

    #[test]
    fn proposed_patch_with_unknown_chapter_is_rejected() {
        let proposed = ProposedPatch::new(
            "tuin",
            PatchDelta::new("gras", PatchOperation::Set, json!(true)),
        );

        assert!(matches!(proposed.validate(), Err(ChapterError::Unknown(_))));
    }

    #[test]
    fn patch_deserializes_from_wire_format() {
        let raw = json!({
            "chapter": "wensen",
            "delta": { "path": "wishes", "operation": "append", "value": { "label": "sauna" } }
        });

        let patch: Patch = serde_json::from_value(raw).unwrap();

        assert_eq!(patch.chapter, Chapter::Wensen);
        assert_eq!(patch.delta.operation, PatchOperation::Append);
    }
}
