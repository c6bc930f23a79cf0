//! Conversation Store Port - Load/append contract for conversation history.
//!
//! Implementations own durability. Every operation returns safe empty
//! defaults on backing-store errors instead of failing; errors are logged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::ConversationTurn;

/// Default number of turns loaded per request.
pub const DEFAULT_LOAD_TURNS: usize = 20;

/// Default result size for relevant-context searches.
pub const DEFAULT_RELEVANT_LIMIT: usize = 5;

/// Most recent turns plus history metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationWindow {
    /// Oldest first.
    pub recent: Vec<ConversationTurn>,
    /// Total turns stored.
    pub turn_count: usize,
    /// True when more turns exist than were loaded.
    pub has_long_history: bool,
}

/// Internal failures of store adapters. Never crosses the port.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Loads the last `max_turns` turns.
    async fn load(&self, max_turns: usize) -> ConversationWindow;

    /// Appends a turn; returns it when stored, `None` on failure.
    async fn add_turn(&self, turn: ConversationTurn) -> Option<ConversationTurn>;

    /// Turns whose text contains `keyword` (case-insensitive), newest first.
    async fn get_relevant_context(&self, keyword: &str, limit: usize) -> Vec<ConversationTurn>;
}
