//! Conversation Store Adapters
//!
//! - **InMemoryConversationStore** - Keeps turns in memory (testing/development)
//! - **FileConversationStore** - One YAML transcript per session directory
//!
//! ```ignore
//! let store = FileConversationStore::new("./data/conversations", session_id);
//! let window = store.load(DEFAULT_LOAD_TURNS).await;
//! ```

mod file_conversation_store;
mod in_memory_conversation_store;

pub use file_conversation_store::FileConversationStore;
pub use in_memory_conversation_store::InMemoryConversationStore;

use crate::domain::conversation::ConversationTurn;
use crate::ports::ConversationWindow;

/// Last `max_turns` of a chronological transcript.
fn window_of(turns: &[ConversationTurn], max_turns: usize) -> ConversationWindow {
    let start = turns.len().saturating_sub(max_turns);
    ConversationWindow {
        recent: turns[start..].to_vec(),
        turn_count: turns.len(),
        has_long_history: turns.len() > max_turns,
    }
}

/// Case-insensitive substring search, newest first.
fn search(turns: &[ConversationTurn], keyword: &str, limit: usize) -> Vec<ConversationTurn> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    turns
        .iter()
        .rev()
        .filter(|turn| turn.text.to_lowercase().contains(&needle))
        .take(limit)
        .cloned()
        .collect()
}
