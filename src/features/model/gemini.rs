//! Google Gemini backend over the REST `generateContent` endpoint

use async_trait::async_trait;
use log::{debug, error, warn};
use serde_json::{json, Value};
use std::time::Instant;

use super::{Generation, GenerativeModel, GENERATION_TIMEOUT};
use crate::core::BotError;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiModel {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiModel {
    pub fn new(api_key: String, model: String) -> Result<Self, BotError> {
        let client = reqwest::Client::builder()
            .timeout(GENERATION_TIMEOUT)
            .build()
            .map_err(|e| BotError::ModelUnavailable(e.to_string()))?;
        Ok(Self {
            api_key,
            model,
            base_url: GEMINI_BASE_URL.to_string(),
            client,
        })
    }

    /// Point at another endpoint (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Generation {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let payload = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}]
        });

        let started = Instant::now();
        let response = match self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Gemini request failed after {:?}: {e}", started.elapsed());
                return Generation::Failed(format!("Gemini request failed: {e}"));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Gemini API error ({status}): {body}");
            return Generation::Failed(format!("Gemini API error ({status})"));
        }

        match response.json::<Value>().await {
            Ok(data) => {
                debug!("Gemini answered in {:?}", started.elapsed());
                interpret_response(&data)
            }
            Err(e) => Generation::Failed(format!("Unreadable Gemini response: {e}")),
        }
    }
}

/// Map a `generateContent` body onto [`Generation`]
pub fn interpret_response(data: &Value) -> Generation {
    if let Some(reason) = data
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        warn!("Gemini blocked the prompt: {reason}");
        return Generation::Blocked;
    }

    let Some(candidate) = data
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
    else {
        warn!("Gemini returned no candidates");
        return Generation::Blocked;
    };

    if candidate.get("finishReason").and_then(Value::as_str) == Some("SAFETY") {
        warn!("Gemini stopped for safety");
        return Generation::Blocked;
    }

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        Generation::Blocked
    } else {
        Generation::Text(text.trim().to_string())
    }
}
