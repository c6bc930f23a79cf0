//! In-Memory Conversation Store Adapter

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::ConversationTurn;
use crate::ports::{ConversationStore, ConversationWindow};

use super::{search, window_of};

/// In-memory transcript for a single session.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStore {
    turns: Arc<RwLock<Vec<ConversationTurn>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store, oldest turn first.
    pub fn with_turns(turns: Vec<ConversationTurn>) -> Self {
        Self {
            turns: Arc::new(RwLock::new(turns)),
        }
    }

    pub async fn turn_count(&self) -> usize {
        self.turns.read().await.len()
    }

    /// Full transcript, oldest first.
    pub async fn all_turns(&self) -> Vec<ConversationTurn> {
        self.turns.read().await.clone()
    }

    pub async fn clear(&self) {
        self.turns.write().await.clear();
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn load(&self, max_turns: usize) -> ConversationWindow {
        window_of(&self.turns.read().await, max_turns)
    }

    async fn add_turn(&self, turn: ConversationTurn) -> Option<ConversationTurn> {
        self.turns.write().await.push(turn.clone());
        Some(turn)
    }

    async fn get_relevant_context(&self, keyword: &str, limit: usize) -> Vec<ConversationTurn> {
        search(&self.turns.read().await, keyword, limit)
    }
}
