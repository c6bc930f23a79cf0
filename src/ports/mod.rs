//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - Raw LLM completions
//! - `LanguageModel` - The response/patch operations the orchestrator calls
//! - `ConversationStore` - Load/append contract for conversation history

mod ai_provider;
mod conversation_store;
mod language_model;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use conversation_store::{
    ConversationStore, ConversationWindow, StoreError, DEFAULT_LOAD_TURNS, DEFAULT_RELEVANT_LIMIT,
};
pub use language_model::{LanguageModel, ModelError, ModelReply, PatchProposal};
