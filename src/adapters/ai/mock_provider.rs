//! Mock AI Provider - Scripted implementation for tests and offline runs.
//!
//! Responses are consumed in FIFO order; once the queue is empty every call
//! returns the default response.
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response(r#"{"patches": [], "followUpQuestion": null}"#)
//!     .with_error(MockError::Unavailable);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
    TokenUsage,
};

const DEFAULT_RESPONSE: &str = "Dank je, ik heb je bericht ontvangen.";

/// Mock AI provider with scripted responses and call recording.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    default_response: String,
    info: ProviderInfo,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success {
        content: String,
        usage: TokenUsage,
        finish_reason: FinishReason,
    },
    Error(MockError),
}

/// Errors the mock can inject.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    Unavailable,
    AuthenticationFailed,
    ContextTooLong,
    Timeout,
    Network(String),
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::Unavailable => AIError::unavailable("mock provider unavailable"),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::ContextTooLong => AIError::context_too_long(250_000, 200_000),
            MockError::Timeout => AIError::Timeout { timeout_secs: 30 },
            MockError::Network(message) => AIError::network(message),
        }
    }
}

impl MockAIProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            default_response: DEFAULT_RESPONSE.to_string(),
            info: ProviderInfo::new("mock", "mock-model", 100_000),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a successful response with usage derived from its length.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        let content = content.into();
        let usage = TokenUsage::new(10, (content.len() / 4).max(1) as u32);
        self.with_response_full(content, usage, FinishReason::Stop)
    }

    pub fn with_response_full(
        self,
        content: impl Into<String>,
        usage: TokenUsage,
        finish_reason: FinishReason,
    ) -> Self {
        lock(&self.responses).push_back(MockResponse::Success {
            content: content.into(),
            usage,
            finish_reason,
        });
        self
    }

    pub fn with_error(self, error: MockError) -> Self {
        lock(&self.responses).push_back(MockResponse::Error(error));
        self
    }

    /// Reply used once the queue is drained.
    pub fn with_default_response(mut self, content: impl Into<String>) -> Self {
        self.default_response = content.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_provider_info(mut self, info: ProviderInfo) -> Self {
        self.info = info;
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Recorded requests, oldest first.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn next_response(&self) -> MockResponse {
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success {
                content: self.default_response.clone(),
                usage: TokenUsage::new(10, 5),
                finish_reason: FinishReason::Stop,
            })
    }
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Poisoning only happens when a test panics mid-call; the data is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        lock(&self.calls).push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_response() {
            MockResponse::Success {
                content,
                usage,
                finish_reason,
            } => Ok(CompletionResponse {
                content,
                usage,
                model: self.info.model.clone(),
                finish_reason,
            }),
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        (text.len() / 4).max(1) as u32
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
