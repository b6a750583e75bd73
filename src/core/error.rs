//! Error taxonomy shared by the persona store, the policy engine and startup
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use thiserror::Error;

/// Every failure the assistant can report.
///
/// All variants except [`BotError::ConfigMissing`] are rendered back to the
/// invoking channel through [`BotError::user_message`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BotError {
    #[error("invalid persona id '{0}'")]
    InvalidId(String),

    #[error("persona id '{0}' already exists")]
    DuplicateId(String),

    #[error("unknown persona id '{0}'")]
    UnknownId(String),

    #[error("persona '{0}' is protected")]
    ProtectedId(String),

    #[error("failed to persist personas: {0}")]
    PersistenceFailure(String),

    #[error("model returned no usable content")]
    ModelBlocked,

    #[error("model client unavailable: {0}")]
    ModelUnavailable(String),

    #[error("missing required configuration: {0}")]
    ConfigMissing(String),
}

impl BotError {
    /// Short text suitable for a chat reply.
    pub fn user_message(&self) -> String {
        match self {
            BotError::InvalidId(id) => format!(
                "Error: invalid ID '{id}'. Use letters, digits and underscores only."
            ),
            BotError::DuplicateId(id) => format!("Error: ID '{id}' already exists."),
            BotError::UnknownId(id) => format!("Error: persona '{id}' not found."),
            BotError::ProtectedId(id) => {
                format!("Error: the '{id}' persona is essential and cannot be changed this way.")
            }
            BotError::PersistenceFailure(_) => {
                "Error: saving personas failed. Nothing was changed.".to_string()
            }
            BotError::ModelBlocked => REFUSAL_MESSAGE.to_string(),
            BotError::ModelUnavailable(_) => "AI brain unavailable right now.".to_string(),
            BotError::ConfigMissing(var) => format!("Configuration error: {var} is not set."),
        }
    }
}

/// Fixed reply used when the model blocks or returns nothing.
pub const REFUSAL_MESSAGE: &str = "I... can't answer that one.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_mention_the_id() {
        assert!(BotError::UnknownId("pirate".into())
            .user_message()
            .contains("pirate"));
        assert!(BotError::DuplicateId("chef".into())
            .user_message()
            .contains("chef"));
        assert!(BotError::ProtectedId("default".into())
            .user_message()
            .contains("default"));
    }

    #[test]
    fn test_blocked_uses_refusal_text() {
        assert_eq!(BotError::ModelBlocked.user_message(), REFUSAL_MESSAGE);
    }

    #[test]
    fn test_display_is_lowercase_diagnostic() {
        let err = BotError::PersistenceFailure("disk full".into());
        assert_eq!(err.to_string(), "failed to persist personas: disk full");
    }
}
