//! Language model adapter over any [`AIProvider`].

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::context::PrunedContext;
use crate::domain::foundation::SessionId;
use crate::domain::response::extract_json_object;
use crate::ports::{
    AIProvider, CompletionRequest, CompletionResponse, LanguageModel, ModelError, ModelReply,
    PatchProposal, RequestMetadata,
};

use super::prompt::{render_messages, render_system_prompt, PATCH_INSTRUCTIONS};

/// Renders prompts from the pruned context and sends them to a provider.
pub struct ProviderLanguageModel {
    provider: Arc<dyn AIProvider>,
    session_id: SessionId,
    max_tokens: u32,
    temperature: f32,
}

impl ProviderLanguageModel {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self {
            provider,
            session_id: SessionId::new(),
            max_tokens: 1024,
            temperature: 0.4,
        }
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn call(
        &self,
        system_prompt: String,
        query: &str,
        context: &PrunedContext,
        temperature: f32,
    ) -> Result<CompletionResponse, ModelError> {
        let trace_id = uuid::Uuid::new_v4().to_string();
        let mut request = CompletionRequest::new(RequestMetadata::new(self.session_id, &trace_id))
            .with_system_prompt(system_prompt)
            .with_max_tokens(self.max_tokens)
            .with_temperature(temperature);
        request.messages = render_messages(context, query);

        tracing::debug!(
            trace_id = %trace_id,
            goal = %context.plan.goal,
            context_tokens = context.token_estimate,
            provider = %self.provider.provider_info().name,
            "Sending model request"
        );

        let response = self.provider.complete(request).await?;
        if response.content.trim().is_empty() {
            return Err(ModelError::Empty);
        }
        Ok(response)
    }
}

#[async_trait]
impl LanguageModel for ProviderLanguageModel {
    async fn generate_response(
        &self,
        query: &str,
        context: &PrunedContext,
    ) -> Result<ModelReply, ModelError> {
        let response = self
            .call(render_system_prompt(context), query, context, self.temperature)
            .await?;

        Ok(ModelReply {
            text: response.content,
            tokens_used: response.usage.total_tokens,
        })
    }

    async fn generate_patch(
        &self,
        query: &str,
        context: &PrunedContext,
    ) -> Result<PatchProposal, ModelError> {
        let system_prompt = format!("{}\n\n{}", render_system_prompt(context), PATCH_INSTRUCTIONS);
        // Structured output: keep it deterministic.
        let response = self.call(system_prompt, query, context, 0.0).await?;

        parse_proposal(&response)
    }
}

fn parse_proposal(response: &CompletionResponse) -> Result<PatchProposal, ModelError> {
    let value =
        extract_json_object(&response.content).map_err(|e| ModelError::Parse(e.to_string()))?;
    let mut proposal: PatchProposal =
        serde_json::from_value(value).map_err(|e| ModelError::Parse(e.to_string()))?;

    if proposal.tokens_used == 0 {
        proposal.tokens_used = response.usage.total_tokens;
    }
    Ok(proposal)
}
