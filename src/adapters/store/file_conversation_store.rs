//! File-based Conversation Store Adapter
//!
//! Stores one session's transcript as `<base>/<session_id>/transcript.yaml`.
//! Failures are logged and mapped to empty defaults; the port never errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::conversation::ConversationTurn;
use crate::domain::foundation::SessionId;
use crate::ports::{ConversationStore, ConversationWindow, StoreError};

use super::{search, window_of};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Transcript {
    #[serde(default)]
    turns: Vec<ConversationTurn>,
}

/// YAML transcript storage for a single session.
#[derive(Debug, Clone)]
pub struct FileConversationStore {
    base_path: PathBuf,
    session_id: SessionId,
    /// Serializes read-modify-write cycles on the transcript.
    write_lock: Arc<Mutex<()>>,
}

impl FileConversationStore {
    pub fn new<P: AsRef<Path>>(base_path: P, session_id: SessionId) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            session_id,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn session_dir(&self) -> PathBuf {
        self.base_path.join(self.session_id.to_string())
    }

    fn transcript_path(&self) -> PathBuf {
        self.session_dir().join("transcript.yaml")
    }

    async fn read_transcript(&self) -> Result<Transcript, StoreError> {
        let path = self.transcript_path();
        if !path.exists() {
            return Ok(Transcript::default());
        }

        let yaml = fs::read_to_string(&path).await?;
        serde_yaml::from_str(&yaml).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn write_transcript(&self, transcript: &Transcript) -> Result<(), StoreError> {
        fs::create_dir_all(self.session_dir()).await?;

        let yaml = serde_yaml::to_string(transcript)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(self.transcript_path(), yaml).await?;
        Ok(())
    }

    async fn turns(&self) -> Vec<ConversationTurn> {
        match self.read_transcript().await {
            Ok(transcript) => transcript.turns,
            Err(err) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    error = %err,
                    "Failed to read conversation transcript"
                );
                Vec::new()
            }
        }
    }

    async fn append(&self, turn: &ConversationTurn) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut transcript = self.read_transcript().await?;
        transcript.turns.push(turn.clone());
        self.write_transcript(&transcript).await
    }
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    async fn load(&self, max_turns: usize) -> ConversationWindow {
        window_of(&self.turns().await, max_turns)
    }

    async fn add_turn(&self, turn: ConversationTurn) -> Option<ConversationTurn> {
        match self.append(&turn).await {
            Ok(()) => Some(turn),
            Err(err) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    turn_id = %turn.id,
                    error = %err,
                    "Failed to append conversation turn"
                );
                None
            }
        }
    }

    async fn get_relevant_context(&self, keyword: &str, limit: usize) -> Vec<ConversationTurn> {
        search(&self.turns().await, keyword, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::wizard::Patch;
    use crate::domain::foundation::Chapter;
    use serde_json::json;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> FileConversationStore {
        FileConversationStore::new(dir.path(), SessionId::new())
    }

    #[tokio::test]
    async fn missing_transcript_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let window = store(&temp_dir).load(20).await;
        assert_eq!(window, ConversationWindow::default());
    }

    #[tokio::test]
    async fn turns_survive_a_new_store_instance() {
        let temp_dir = TempDir::new().unwrap();
        let session_id = SessionId::new();
        let first = FileConversationStore::new(temp_dir.path(), session_id);

        let patch = Patch::set(Chapter::Budget, "budgetTotaal", json!(300000));
        first.add_turn(ConversationTurn::user("Budget is 3 ton")).await.unwrap();
        first
            .add_turn(ConversationTurn::assistant("Genoteerd.").with_patches(vec![patch.clone()]))
            .await
            .unwrap();

        let reopened = FileConversationStore::new(temp_dir.path(), session_id);
        let window = reopened.load(20).await;

        assert_eq!(window.turn_count, 2);
        assert_eq!(window.recent[0].text, "Budget is 3 ton");
        assert_eq!(window.recent[1].patches_applied, vec![patch]);
        assert!(temp_dir
            .path()
            .join(session_id.to_string())
            .join("transcript.yaml")
            .exists());
    }

    #[tokio::test]
    async fn corrupt_transcript_yields_safe_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        std::fs::create_dir_all(store.session_dir()).unwrap();
        std::fs::write(store.transcript_path(), "turns: [not: valid: yaml").unwrap();

        assert_eq!(store.load(20).await, ConversationWindow::default());
        assert!(store.get_relevant_context("budget", 5).await.is_empty());
        assert!(store.add_turn(ConversationTurn::user("Hoi")).await.is_none());
    }

    #[tokio::test]
    async fn relevant_context_searches_transcript() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        store.add_turn(ConversationTurn::user("Vloerverwarming graag")).await;
        store.add_turn(ConversationTurn::user("En een warmtepomp")).await;

        let found = store.get_relevant_context("vloerverwarming", 5).await;
        assert_eq!(found.len(), 1);
    }
}
