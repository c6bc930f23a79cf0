//! Adapters - Implementations of port interfaces.
//!
//! - `ai` - AI providers and the language model adapter
//! - `store` - Conversation stores (in-memory, YAML files)

pub mod ai;
pub mod store;

pub use ai::{
    AnthropicConfig, AnthropicProvider, MockAIProvider, MockError, ProviderLanguageModel,
};
pub use store::{FileConversationStore, InMemoryConversationStore};
