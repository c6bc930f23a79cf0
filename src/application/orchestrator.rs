//! Response orchestration.
//!
//! Dispatches one model call per turn, validates what comes back and scores
//! the result. Every failure ends in [`OrchestratorResult::fallback`].

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::behavior::{BehaviorProfile, ConfidenceLevel};
use crate::domain::context::PrunedContext;
use crate::domain::planning::TurnPlan;
use crate::domain::response::{OrchestratorResult, ResponseSanitizer, SanitizationError};
use crate::domain::wizard::{Patch, ProposedPatch};
use crate::ports::{LanguageModel, ModelError};

const CONFLICT_CONFIDENCE: f64 = 0.97;
const ANTICIPATION_CONFIDENCE: f64 = 0.85;
const ADVISORY_CONFIDENCE: f64 = 0.7;
const PATCH_BASE_CONFIDENCE: f64 = 0.6;
const PATCH_VALIDITY_WEIGHT: f64 = 0.3;
const LOW_CONFIDENCE_PENALTY: f64 = 0.1;

/// Acknowledgement for data turns where the model asked no follow-up.
const PATCH_ACKNOWLEDGEMENT: &str = "Dank je, ik heb je gegevens verwerkt.";
const NOTHING_RECORDED: &str =
    "Ik heb hier nog niets uit kunnen vastleggen. Kun je het iets concreter maken?";

/// Inputs for one orchestrated turn.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub query: &'a str,
    pub plan: &'a TurnPlan,
    pub context: &'a PrunedContext,
    pub behavior: Option<&'a BehaviorProfile>,
}

#[derive(Debug, Error)]
enum OrchestratorError {
    #[error("model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("response rejected: {0}")]
    Sanitization(#[from] SanitizationError),
}

/// Calls the language model for a planned turn.
pub struct ResponseOrchestrator {
    model: Arc<dyn LanguageModel>,
    sanitizer: ResponseSanitizer,
    timeout: Duration,
}

impl ResponseOrchestrator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            sanitizer: ResponseSanitizer::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: ResponseSanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Never fails: errors, timeouts and unusable output become the fallback.
    pub async fn generate(&self, request: GenerateRequest<'_>) -> OrchestratorResult {
        match tokio::time::timeout(self.timeout, self.dispatch(request)).await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                tracing::warn!(goal = %request.plan.goal, error = %err, "Model turn failed, using fallback");
                OrchestratorResult::fallback()
            }
            Err(_) => {
                tracing::warn!(
                    goal = %request.plan.goal,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Model turn timed out, using fallback"
                );
                OrchestratorResult::fallback()
            }
        }
    }

    async fn dispatch(
        &self,
        request: GenerateRequest<'_>,
    ) -> Result<OrchestratorResult, OrchestratorError> {
        let goal = request.plan.goal;

        if goal.is_data_entry() {
            let proposal = self
                .model
                .generate_patch(request.query, request.context)
                .await?;

            let proposed = proposal.patches.len();
            let patches = validate_patches(proposal.patches);
            let text = match (&proposal.follow_up_question, patches.is_empty()) {
                (Some(question), _) => question.clone(),
                (None, false) => PATCH_ACKNOWLEDGEMENT.to_string(),
                (None, true) => NOTHING_RECORDED.to_string(),
            };

            return Ok(OrchestratorResult {
                draft_response: self.sanitizer.sanitize(&text)?,
                confidence: patch_confidence(patches.len(), proposed),
                patches,
                tokens_used: proposal.tokens_used,
                follow_up_question: proposal.follow_up_question,
            });
        }

        let reply = self
            .model
            .generate_response(request.query, request.context)
            .await?;

        Ok(OrchestratorResult {
            draft_response: self.sanitizer.sanitize(&reply.text)?,
            patches: Vec::new(),
            tokens_used: reply.tokens_used,
            confidence: response_confidence(request.plan, request.behavior),
            follow_up_question: None,
        })
    }
}

/// Keeps patches addressed to a known chapter.
fn validate_patches(proposed: Vec<ProposedPatch>) -> Vec<Patch> {
    proposed
        .into_iter()
        .filter_map(|patch| {
            let chapter = patch.chapter.clone();
            match patch.validate() {
                Ok(valid) => Some(valid),
                Err(err) => {
                    tracing::warn!(chapter = %chapter, error = %err, "Dropping patch for unknown chapter");
                    None
                }
            }
        })
        .collect()
}

fn patch_confidence(valid: usize, proposed: usize) -> f64 {
    let ratio = if proposed == 0 {
        0.0
    } else {
        valid as f64 / proposed as f64
    };
    PATCH_BASE_CONFIDENCE + PATCH_VALIDITY_WEIGHT * ratio
}

fn response_confidence(plan: &TurnPlan, behavior: Option<&BehaviorProfile>) -> f64 {
    if plan.goal.is_conflict_driven() {
        return CONFLICT_CONFIDENCE;
    }
    if plan.goal.is_anticipation_driven() {
        return ANTICIPATION_CONFIDENCE;
    }

    match behavior.map(|b| b.confidence_level) {
        Some(ConfidenceLevel::Low) => ADVISORY_CONFIDENCE - LOW_CONFIDENCE_PENALTY,
        _ => ADVISORY_CONFIDENCE,
    }
}
