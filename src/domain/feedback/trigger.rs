//! Observed field changes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::foundation::{Chapter, Timestamp};

/// Who changed the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerSource {
    User,
    Ai,
}

/// One observed field change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTrigger {
    pub id: String,
    /// Full dotted path including the chapter key, e.g. `budget.budgetTotaal`.
    pub field_path: String,
    pub chapter: Chapter,
    #[serde(default)]
    pub previous_value: Option<Value>,
    pub new_value: Value,
    pub confidence: f64,
    pub source: TriggerSource,
    pub timestamp: Timestamp,
}

impl FieldTrigger {
    pub fn new(
        chapter: Chapter,
        field_path: impl Into<String>,
        new_value: Value,
        source: TriggerSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            field_path: field_path.into(),
            chapter,
            previous_value: None,
            new_value,
            confidence: 1.0,
            source,
            timestamp: Timestamp::now(),
        }
    }

    pub fn with_previous(mut self, previous: Value) -> Self {
        self.previous_value = Some(previous);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn confidence_is_clamped() {
        let trigger = FieldTrigger::new(Chapter::Budget, "budget.budgetTotaal", json!(1), TriggerSource::Ai)
            .with_confidence(1.7);
        assert_eq!(trigger.confidence, 1.0);
    }

    #[test]
    fn serializes_camel_case_with_lowercase_source() {
        let trigger = FieldTrigger::new(Chapter::Budget, "budget.budgetTotaal", json!(300), TriggerSource::User)
            .with_previous(json!(200));

        let json = serde_json::to_value(&trigger).unwrap();

        assert_eq!(json["fieldPath"], "budget.budgetTotaal");
        assert_eq!(json["previousValue"], 200);
        assert_eq!(json["source"], "user");
        assert_eq!(json["chapter"], "budget");
    }
}
