//! Language Model Port - The two operations the dialogue core needs from an
//! external model.
//!
//! Both operations may fail; the response orchestrator is the only caller
//! and turns every failure into the fallback result.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::context::PrunedContext;
use crate::domain::wizard::ProposedPatch;

use super::ai_provider::AIError;

/// Free-text reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelReply {
    pub text: String,
    pub tokens_used: u32,
}

/// Structured data-entry reply. Patches are unvalidated model output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchProposal {
    #[serde(default)]
    pub patches: Vec<ProposedPatch>,
    #[serde(default)]
    pub follow_up_question: Option<String>,
    #[serde(default)]
    pub tokens_used: u32,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("provider error: {0}")]
    Provider(#[from] AIError),

    #[error("empty model output")]
    Empty,

    #[error("unparseable model output: {0}")]
    Parse(String),
}

/// External language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Free-text answer to the query given the pruned context.
    async fn generate_response(
        &self,
        query: &str,
        context: &PrunedContext,
    ) -> Result<ModelReply, ModelError>;

    /// Proposed patches plus an optional follow-up question.
    async fn generate_patch(
        &self,
        query: &str,
        context: &PrunedContext,
    ) -> Result<PatchProposal, ModelError>;
}
