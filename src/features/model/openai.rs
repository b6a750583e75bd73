//! OpenAI chat-completions backend
//!
//! The `openai` crate reads its key from `OPENAI_API_KEY`; `main` exports it
//! from the loaded configuration before this client is used.

use async_trait::async_trait;
use log::{debug, error, warn};
use openai::chat::{ChatCompletion, ChatCompletionMessage, ChatCompletionMessageRole};
use std::time::Instant;
use tokio::time::timeout;

use super::{Generation, GenerativeModel, GENERATION_TIMEOUT};

pub struct OpenAiModel {
    model: String,
}

impl OpenAiModel {
    pub fn new(model: String) -> Self {
        Self { model }
    }
}

#[async_trait]
impl GenerativeModel for OpenAiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Generation {
        // The whole contextual prompt travels as one user turn
        let messages = vec![ChatCompletionMessage {
            role: ChatCompletionMessageRole::User,
            content: Some(prompt.to_string()),
            name: None,
            function_call: None,
            tool_call_id: None,
            tool_calls: None,
        }];

        let started = Instant::now();
        let completion = match timeout(
            GENERATION_TIMEOUT,
            ChatCompletion::builder(&self.model, messages).create(),
        )
        .await
        {
            Err(_) => {
                error!("OpenAI request timed out after {:?}", started.elapsed());
                return Generation::Failed("OpenAI request timed out".to_string());
            }
            Ok(Err(e)) => {
                error!("OpenAI API error after {:?}: {e}", started.elapsed());
                return Generation::Failed(format!("OpenAI API error: {e}"));
            }
            Ok(Ok(completion)) => completion,
        };

        debug!(
            "OpenAI answered in {:?} with {} choice(s)",
            started.elapsed(),
            completion.choices.len()
        );

        interpret_content(
            completion
                .choices
                .first()
                .and_then(|choice| choice.message.content.as_deref()),
        )
    }
}

/// Empty or missing content counts as a refusal
pub fn interpret_content(content: Option<&str>) -> Generation {
    match content.map(str::trim) {
        Some(text) if !text.is_empty() => Generation::Text(text.to_string()),
        _ => {
            warn!("OpenAI returned no content");
            Generation::Blocked
        }
    }
}
