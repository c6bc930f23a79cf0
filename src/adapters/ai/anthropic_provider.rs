//! Anthropic Provider - Implementation of AIProvider for Anthropic's Messages API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = AnthropicConfig::new(api_key)
//!     .with_model("claude-sonnet-4-20250514")
//!     .with_max_retries(2);
//!
//! let provider = AnthropicProvider::new(config)?;
//! ```
//!
//! Transient failures (rate limits, 5xx, network, timeouts) are retried with
//! exponential backoff here, so callers never retry themselves.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, MessageRole,
    ProviderInfo, TokenUsage,
};

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Configuration for the Anthropic provider.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub backoff: Duration,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            backoff: Duration::from_secs(1),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Anthropic API provider implementation.
pub struct AnthropicProvider {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    /// Converts our request to Anthropic's format.
    fn to_anthropic_request(&self, request: &CompletionRequest) -> AnthropicRequest {
        let mut messages: Vec<AnthropicMessage> = request
            .messages
            .iter()
            .map(|msg| AnthropicMessage {
                role: match msg.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            })
            .collect();

        // The API requires the first message to come from the user.
        if messages.first().map(|m| m.role.as_str()) != Some("user") {
            messages.insert(
                0,
                AnthropicMessage {
                    role: "user".to_string(),
                    content: "(gesprek hervat)".to_string(),
                },
            );
        }

        AnthropicRequest {
            model: self.config.model.clone(),
            messages,
            system: request.system_prompt.clone(),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: request.temperature,
        }
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, AIError> {
        self.client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("Content-Type", "application/json")
            .json(&self.to_anthropic_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    /// Maps non-success statuses onto [`AIError`].
    async fn handle_response_status(&self, response: Response) -> Result<Response, AIError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        Err(map_status(status.as_u16(), error_body))
    }

    async fn parse_response(&self, response: Response) -> Result<CompletionResponse, AIError> {
        let response = self.handle_response_status(response).await?;

        let anthropic_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        Ok(anthropic_response.into_completion())
    }

    async fn attempt(&self, request: &CompletionRequest) -> Result<CompletionResponse, AIError> {
        let response = self.send_request(request).await?;
        self.parse_response(response).await
    }
}

#[async_trait]
impl AIProvider for AnthropicProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let mut retry_count = 0;

        loop {
            match self.attempt(&request).await {
                Ok(completion) => return Ok(completion),
                Err(err) if err.is_retryable() && retry_count < self.config.max_retries => {
                    let delay = self.config.backoff * (1 << retry_count);
                    tracing::warn!(
                        error = %err,
                        retry = retry_count + 1,
                        trace_id = %request.metadata.trace_id,
                        "Anthropic request failed, retrying in {:?}",
                        delay
                    );
                    sleep(delay).await;
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        text.chars().count().div_ceil(4).max(1) as u32
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("anthropic", &self.config.model, 200_000)
    }
}

fn map_status(status: u16, error_body: String) -> AIError {
    match status {
        401 | 403 => AIError::AuthenticationFailed,
        429 => AIError::rate_limited(parse_retry_after(&error_body)),
        400 if error_body.contains("prompt is too long") => AIError::context_too_long(0, 0),
        400 => AIError::InvalidRequest(error_body),
        500..=599 => AIError::unavailable(format!("Server error {}: {}", status, error_body)),
        _ => AIError::network(format!("Unexpected status {}: {}", status, error_body)),
    }
}

/// Reads "try again in Ns" from the error message; defaults to 60s.
fn parse_retry_after(error_body: &str) -> u32 {
    serde_json::from_str::<serde_json::Value>(error_body)
        .ok()
        .as_ref()
        .and_then(|parsed| parsed.pointer("/error/message"))
        .and_then(|msg| msg.as_str())
        .and_then(|msg| {
            let rest = &msg[msg.find("try again in ")? + "try again in ".len()..];
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        })
        .unwrap_or(60)
}

// ----- Anthropic API Types -----

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

impl AnthropicResponse {
    fn into_completion(self) -> CompletionResponse {
        let content = self
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        let finish_reason = match self.stop_reason.as_deref() {
            Some("max_tokens") => FinishReason::Length,
            Some("refusal") => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        };

        CompletionResponse {
            content,
            usage: TokenUsage::new(self.usage.input_tokens, self.usage.output_tokens),
            model: self.model,
            finish_reason,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;
    use crate::ports::{Message, RequestMetadata};

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(AnthropicConfig::new("test-key")).unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(SessionId::new(), "trace"))
    }

    #[test]
    fn config_defaults() {
        let config = AnthropicConfig::new("key");
        assert_eq!(config.base_url, "https://api.anthropic.com");
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.api_key(), "key");
    }

    #[test]
    fn messages_url_ignores_trailing_slash() {
        let provider =
            AnthropicProvider::new(AnthropicConfig::new("k").with_base_url("http://localhost:9000/"))
                .unwrap();
        assert_eq!(provider.messages_url(), "http://localhost:9000/v1/messages");
    }

    #[test]
    fn request_starts_with_user_message() {
        let mut req = request().with_system_prompt("Systeem");
        req.messages.push(Message::assistant("Welkom"));
        req.messages.push(Message::user("Hoi"));

        let converted = provider().to_anthropic_request(&req);

        assert_eq!(converted.messages.len(), 3);
        assert_eq!(converted.messages[0].role, "user");
        assert_eq!(converted.messages[1].role, "assistant");
        assert_eq!(converted.system.as_deref(), Some("Systeem"));
        assert_eq!(converted.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn response_text_blocks_are_joined() {
        let raw = r#"{
            "model": "claude",
            "content": [{"type": "text", "text": "Hallo "}, {"type": "tool_use"}, {"type": "text", "text": "daar"}],
            "stop_reason": "max_tokens",
            "usage": {"input_tokens": 12, "output_tokens": 3}
        }"#;
        let completion = serde_json::from_str::<AnthropicResponse>(raw)
            .unwrap()
            .into_completion();

        assert_eq!(completion.content, "Hallo daar");
        assert_eq!(completion.finish_reason, FinishReason::Length);
        assert_eq!(completion.usage.total_tokens, 15);
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(map_status(401, String::new()), AIError::AuthenticationFailed));
        assert!(matches!(
            map_status(400, "prompt is too long".to_string()),
            AIError::ContextTooLong { .. }
        ));
        assert!(matches!(map_status(400, "bad".to_string()), AIError::InvalidRequest(_)));
        assert!(map_status(529, String::new()).is_retryable());
        assert!(map_status(429, String::new()).is_retryable());
    }

    #[test]
    fn parse_retry_after_reads_message() {
        let body = r#"{"error":{"message":"Rate limit, please try again in 12s"}}"#;
        assert_eq!(parse_retry_after(body), 12);
        assert_eq!(parse_retry_after(r#"{"error":{"message":"Rate limit"}}"#), 60);
        assert_eq!(parse_retry_after("not json"), 60);
    }

    #[test]
    fn estimate_tokens_approximates() {
        assert_eq!(provider().estimate_tokens("Hi"), 1);
        assert_eq!(provider().estimate_tokens("Hello, world!"), 4);
    }

    #[test]
    fn provider_info_names_anthropic() {
        let info = provider().provider_info();
        assert_eq!(info.name, "anthropic");
        assert_eq!(info.max_context_tokens, 200_000);
    }
}
