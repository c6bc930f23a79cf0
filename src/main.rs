//! `wizard-dialogue [request.json]`
//!
//! Runs an optional chapter start and one turn for the JSON request read from
//! the given file (or stdin) and prints the outcome as JSON.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;

use wizard_dialogue::adapters::{
    AnthropicConfig, AnthropicProvider, FileConversationStore, InMemoryConversationStore,
    MockAIProvider, ProviderLanguageModel,
};
use wizard_dialogue::application::{
    ChapterOpeningResponse, DialogueSession, TurnInput, TurnOutcome, TurnPipeline,
};
use wizard_dialogue::config::{AiConfig, AiProvider, AppConfig, StoreBackend};
use wizard_dialogue::domain::foundation::SessionId;
use wizard_dialogue::domain::wizard::WizardState;
use wizard_dialogue::ports::{AIError, AIProvider, ConversationStore};

type BoxError = Box<dyn std::error::Error>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunRequest {
    chapter: Option<String>,
    message: Option<String>,
    #[serde(default)]
    wizard_state: serde_json::Value,
    focused_field: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunOutput {
    session_id: SessionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    opening: Option<ChapterOpeningResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<TurnOutcome>,
    wizard_state: WizardState,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    config.logging.init();
    config.validate()?;

    let request = read_request(std::env::args().nth(1))?;
    let session_id = SessionId::new();

    let model = ProviderLanguageModel::new(build_provider(&config.ai)?)
        .with_session(session_id)
        .with_max_tokens(config.ai.max_tokens);
    let store: Arc<dyn ConversationStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(InMemoryConversationStore::new()),
        StoreBackend::File => Arc::new(FileConversationStore::new(&config.store.data_dir, session_id)),
    };
    let pipeline = TurnPipeline::new(
        Arc::new(model),
        store,
        config.dialogue.pipeline_config(config.ai.turn_timeout()),
    );

    let mut session = DialogueSession::new(session_id)
        .with_state(WizardState::from_json(&request.wizard_state));
    session.focused_field = request.focused_field;

    let opening = match request.chapter.as_deref() {
        Some(key) => pipeline.enter_chapter_key(&mut session, key).await,
        None => None,
    };

    let outcome = match request.message {
        Some(message) if !message.trim().is_empty() => {
            Some(pipeline.handle_message(&mut session, TurnInput::new(message)).await)
        }
        _ => None,
    };

    let output = RunOutput {
        session_id,
        opening,
        outcome,
        wizard_state: session.wizard_state,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn build_provider(config: &AiConfig) -> Result<Arc<dyn AIProvider>, AIError> {
    match config.provider {
        AiProvider::Mock => Ok(Arc::new(MockAIProvider::new())),
        AiProvider::Anthropic => {
            let key = config.anthropic_api_key.clone().unwrap_or_default();
            let anthropic = AnthropicConfig::new(key)
                .with_model(&config.model)
                .with_base_url(&config.base_url)
                .with_timeout(config.timeout())
                .with_max_retries(config.max_retries);
            Ok(Arc::new(AnthropicProvider::new(anthropic)?))
        }
    }
}

fn read_request(path: Option<String>) -> Result<RunRequest, BoxError> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    if raw.trim().is_empty() {
        return Ok(RunRequest::default());
    }
    Ok(serde_json::from_str(&raw)?)
}
