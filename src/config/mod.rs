//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `WIZARD_DIALOGUE` prefix
//! and `__` between nested keys. Every section has defaults, so an empty
//! environment loads.
//!
//! # Example
//!
//! ```no_run
//! use wizard_dialogue::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod dialogue;
mod error;
mod logging;
mod store;

pub use ai::{AiConfig, AiProvider};
pub use dialogue::DialogueConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::{LogFormat, LoggingConfig};
pub use store::{StoreBackend, StoreConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Language model provider (Anthropic or mock)
    #[serde(default)]
    pub ai: AiConfig,

    /// Pruning, behavior and debounce limits
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// Conversation store backend
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `WIZARD_DIALOGUE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `WIZARD_DIALOGUE__AI__PROVIDER=anthropic` -> `ai.provider = anthropic`
    /// - `WIZARD_DIALOGUE__DIALOGUE__TOKEN_CEILING=3000` -> `dialogue.token_ceiling = 3000`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("WIZARD_DIALOGUE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first section that is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.dialogue.validate()?;
        self.store.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
