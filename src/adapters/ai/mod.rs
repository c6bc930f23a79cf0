//! AI Provider Adapters.
//!
//! - `AnthropicProvider` - Anthropic Messages API
//! - `MockAIProvider` - Scripted provider for tests and offline runs
//! - `ProviderLanguageModel` - Wizard prompts on top of any provider

mod anthropic_provider;
mod mock_provider;
mod prompt;
mod provider_model;

pub use anthropic_provider::{AnthropicConfig, AnthropicProvider};
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use prompt::{render_messages, render_system_prompt, PATCH_INSTRUCTIONS};
pub use provider_model::ProviderLanguageModel;
