//! Dialogue tuning: pruning budget, behavior window, debounce

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::TurnPipelineConfig;
use crate::domain::context::PrunerConfig;
use crate::domain::feedback::FeedbackQueueConfig;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DialogueConfig {
    /// Exclusive upper bound on the pruned context estimate
    #[serde(default = "default_token_ceiling")]
    pub token_ceiling: u32,

    #[serde(default = "default_history_window")]
    pub history_window: usize,

    #[serde(default = "default_anticipation_history_window")]
    pub anticipation_history_window: usize,

    #[serde(default = "default_max_kb_nuggets")]
    pub max_kb_nuggets: usize,

    #[serde(default = "default_max_customer_examples")]
    pub max_customer_examples: usize,

    /// User turns considered by the behavior analyzer
    #[serde(default = "default_behavior_window")]
    pub behavior_window: usize,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_max_flush_triggers")]
    pub max_flush_triggers: usize,

    /// Turns loaded from the conversation store per message
    #[serde(default = "default_store_history_turns")]
    pub store_history_turns: usize,
}

impl DialogueConfig {
    pub fn pruner_config(&self) -> PrunerConfig {
        PrunerConfig {
            token_ceiling: self.token_ceiling,
            history_window: self.history_window,
            anticipation_history_window: self.anticipation_history_window,
            max_kb_nuggets: self.max_kb_nuggets,
            max_customer_examples: self.max_customer_examples,
        }
    }

    pub fn feedback_config(&self) -> FeedbackQueueConfig {
        FeedbackQueueConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            max_flush: self.max_flush_triggers,
        }
    }

    pub fn pipeline_config(&self, model_timeout: Duration) -> TurnPipelineConfig {
        TurnPipelineConfig {
            pruner: self.pruner_config(),
            behavior_window: self.behavior_window,
            feedback: self.feedback_config(),
            store_history_turns: self.store_history_turns,
            model_timeout,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let limits = [
            ("dialogue.token_ceiling", self.token_ceiling as u64),
            ("dialogue.history_window", self.history_window as u64),
            ("dialogue.behavior_window", self.behavior_window as u64),
            ("dialogue.debounce_ms", self.debounce_ms),
            ("dialogue.max_flush_triggers", self.max_flush_triggers as u64),
            ("dialogue.store_history_turns", self.store_history_turns as u64),
        ];

        match limits.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(ValidationError::ZeroLimit(*name)),
            None => Ok(()),
        }
    }
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            token_ceiling: default_token_ceiling(),
            history_window: default_history_window(),
            anticipation_history_window: default_anticipation_history_window(),
            max_kb_nuggets: default_max_kb_nuggets(),
            max_customer_examples: default_max_customer_examples(),
            behavior_window: default_behavior_window(),
            debounce_ms: default_debounce_ms(),
            max_flush_triggers: default_max_flush_triggers(),
            store_history_turns: default_store_history_turns(),
        }
    }
}

fn default_token_ceiling() -> u32 {
    4_000
}

fn default_history_window() -> usize {
    3
}

fn default_anticipation_history_window() -> usize {
    2
}

fn default_max_kb_nuggets() -> usize {
    3
}

fn default_max_customer_examples() -> usize {
    2
}

fn default_behavior_window() -> usize {
    10
}

fn default_debounce_ms() -> u64 {
    800
}

fn default_max_flush_triggers() -> usize {
    2
}

fn default_store_history_turns() -> usize {
    20
}
