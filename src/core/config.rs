//! Environment-driven configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use crate::core::error::BotError;
use log::warn;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PERSONAS_FILE: &str = "personas.json";
pub const DEFAULT_PROMPT_FILE: &str = "prompt.txt";
pub const DEFAULT_TIMEOUT_MINUTES: u64 = 2;
pub const DEFAULT_MAX_HISTORY: usize = 20;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Which generative backend answers messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelProvider {
    Gemini,
    OpenAi,
}

impl ModelProvider {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "gemini" | "google" => Some(ModelProvider::Gemini),
            "openai" => Some(ModelProvider::OpenAi),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub discord_guild_id: Option<String>,
    pub model_provider: ModelProvider,
    pub model_api_key: String,
    pub model_name: String,
    /// Channel where every message is answered without a mention
    pub target_channel_id: Option<u64>,
    pub personas_file: PathBuf,
    pub default_prompt_file: PathBuf,
    pub context_timeout: Duration,
    pub max_history: usize,
    pub assistant_name: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, BotError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so tests never touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let discord_token =
            get("DISCORD_TOKEN").ok_or_else(|| BotError::ConfigMissing("DISCORD_TOKEN".into()))?;

        let model_provider = match get("MODEL_PROVIDER") {
            Some(raw) => ModelProvider::parse(&raw).unwrap_or_else(|| {
                warn!("Unknown MODEL_PROVIDER '{raw}', using gemini");
                ModelProvider::Gemini
            }),
            None => ModelProvider::Gemini,
        };

        let (key_var, model_var, default_model) = match model_provider {
            ModelProvider::Gemini => ("GEMINI_API_KEY", "GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            ModelProvider::OpenAi => ("OPENAI_API_KEY", "OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
        };
        let model_api_key = get(key_var).ok_or_else(|| BotError::ConfigMissing(key_var.into()))?;
        let model_name = get(model_var).unwrap_or_else(|| default_model.to_string());

        let target_channel_id = get("TARGET_CHANNEL_ID")
            .and_then(|raw| parse_or_warn::<u64>("TARGET_CHANNEL_ID", &raw))
            .filter(|id| *id != 0);

        let timeout_minutes = get("CONTEXT_TIMEOUT_MINUTES")
            .and_then(|raw| parse_or_warn::<u64>("CONTEXT_TIMEOUT_MINUTES", &raw))
            .unwrap_or(DEFAULT_TIMEOUT_MINUTES);

        let max_history = get("MAX_HISTORY_ITEMS")
            .and_then(|raw| parse_or_warn::<usize>("MAX_HISTORY_ITEMS", &raw))
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_HISTORY);

        Ok(Config {
            discord_token,
            discord_guild_id: get("DISCORD_GUILD_ID"),
            model_provider,
            model_api_key,
            model_name,
            target_channel_id,
            personas_file: get("PERSONAS_FILE")
                .unwrap_or_else(|| DEFAULT_PERSONAS_FILE.to_string())
                .into(),
            default_prompt_file: get("DEFAULT_PROMPT_FILE")
                .unwrap_or_else(|| DEFAULT_PROMPT_FILE.to_string())
                .into(),
            context_timeout: Duration::from_secs(timeout_minutes.saturating_mul(60)),
            max_history,
            assistant_name: get("ASSISTANT_NAME").unwrap_or_else(|| "Assistant".to_string()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring unparsable {key}='{raw}', using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_gemini_config_uses_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "token"),
            ("GEMINI_API_KEY", "key"),
        ]))
        .unwrap();

        assert_eq!(config.model_provider, ModelProvider::Gemini);
        assert_eq!(config.model_name, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.context_timeout, Duration::from_secs(120));
        assert_eq!(config.max_history, 20);
        assert_eq!(config.target_channel_id, None);
        assert_eq!(config.personas_file, PathBuf::from("personas.json"));
    }

    #[test]
    fn test_missing_discord_token_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "key")])).unwrap_err();
        assert_eq!(err, BotError::ConfigMissing("DISCORD_TOKEN".into()));
    }

    #[test]
    fn test_missing_key_for_selected_provider() {
        let err = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "token"),
            ("MODEL_PROVIDER", "openai"),
            ("GEMINI_API_KEY", "key"),
        ]))
        .unwrap_err();
        assert_eq!(err, BotError::ConfigMissing("OPENAI_API_KEY".into()));
    }

    #[test]
    fn test_zero_target_channel_means_none() {
        let config = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "token"),
            ("GEMINI_API_KEY", "key"),
            ("TARGET_CHANNEL_ID", "0"),
        ]))
        .unwrap();
        assert_eq!(config.target_channel_id, None);
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let config = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "token"),
            ("MODEL_PROVIDER", "OpenAI"),
            ("OPENAI_API_KEY", "sk"),
            ("TARGET_CHANNEL_ID", "123456"),
            ("CONTEXT_TIMEOUT_MINUTES", "5"),
            ("MAX_HISTORY_ITEMS", "lots"),
        ]))
        .unwrap();

        assert_eq!(config.model_provider, ModelProvider::OpenAi);
        assert_eq!(config.model_name, DEFAULT_OPENAI_MODEL);
        assert_eq!(config.target_channel_id, Some(123456));
        assert_eq!(config.context_timeout, Duration::from_secs(300));
        assert_eq!(config.max_history, DEFAULT_MAX_HISTORY);
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let config = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "token"),
            ("GEMINI_API_KEY", "key"),
            ("CONTEXT_TIMEOUT_MINUTES", "18446744073709551615"),
        ]))
        .unwrap();
        assert_eq!(config.context_timeout, Duration::from_secs(u64::MAX));
    }
}
