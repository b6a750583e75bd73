//! # Feature: Generative Model Clients
//!
//! Pluggable text-generation backends. Every backend folds its transport
//! errors and safety filtering into [`Generation`], so callers can only
//! record history on a successful `Text`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{BotError, Config, ModelProvider};

pub use gemini::GeminiModel;
pub use openai::OpenAiModel;

/// Upper bound for a single generation call
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(45);

/// Outcome of a generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Text(String),
    /// Safety filter tripped or the model produced nothing
    Blocked,
    /// Transport or API failure
    Failed(String),
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Generation;
}

/// Build the backend selected in the configuration
pub fn build_model(config: &Config) -> Result<Arc<dyn GenerativeModel>, BotError> {
    let model: Arc<dyn GenerativeModel> = match config.model_provider {
        ModelProvider::Gemini => Arc::new(GeminiModel::new(
            config.model_api_key.clone(),
            config.model_name.clone(),
        )?),
        ModelProvider::OpenAi => Arc::new(OpenAiModel::new(config.model_name.clone())),
    };
    info!("🧠 Model client ready: {}", model.name());
    Ok(model)
}
