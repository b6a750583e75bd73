//! Slash command handler trait and infrastructure
//!
//! Handlers never touch serenity: the Discord adapter turns an interaction
//! into a [`CommandInvocation`] and sends back the [`CommandReply`].
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::context::CommandContext;
use crate::core::BotError;

/// A command call with its options flattened to strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandInvocation {
    pub name: String,
    pub options: HashMap<String, String>,
    /// Display name of the invoking user, for logs
    pub user: String,
    /// Gateway heartbeat latency when the transport knows it
    pub latency: Option<Duration>,
}

impl CommandInvocation {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_option(mut self, name: &str, value: &str) -> Self {
        self.options.insert(name.to_string(), value.to_string());
        self
    }

    /// Option value as supplied (not trimmed), None when omitted
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    pub fn required_option(&self, name: &str) -> Result<&str> {
        self.option(name)
            .ok_or_else(|| anyhow!("missing required option '{}' for /{}", name, self.name))
    }
}

/// What a handler wants sent back to the invoker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub content: String,
    /// Only the invoker sees it
    pub ephemeral: bool,
}

impl CommandReply {
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    pub fn private(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}

impl From<BotError> for CommandReply {
    fn from(error: BotError) -> Self {
        CommandReply::private(error.user_message())
    }
}

/// Trait for slash command handlers
///
/// Each command handler implements this trait to process one or more slash commands.
/// Handlers are registered with a CommandRegistry and dispatched based on command name.
///
/// # Example
///
/// ```ignore
/// pub struct PingHandler;
///
/// #[async_trait]
/// impl SlashCommandHandler for PingHandler {
///     fn command_names(&self) -> &'static [&'static str] {
///         &["ping"]
///     }
///
///     async fn handle(
///         &self,
///         ctx: Arc<CommandContext>,
///         invocation: &CommandInvocation,
///     ) -> Result<CommandReply> {
///         Ok(CommandReply::public("Pong!"))
///     }
/// }
/// ```
#[async_trait]
pub trait SlashCommandHandler: Send + Sync {
    /// Command name(s) this handler processes
    fn command_names(&self) -> &'static [&'static str];

    /// Handle the command. Domain failures come back as an ephemeral reply;
    /// `Err` is reserved for plumbing problems (missing options and the like).
    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        invocation: &CommandInvocation,
    ) -> Result<CommandReply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that the trait is object-safe (can be used with dyn)
    fn _assert_object_safe(_: &dyn SlashCommandHandler) {}

    #[test]
    fn test_invocation_options() {
        let invocation = CommandInvocation::new("persona_set").with_option("persona_id", "pirate");

        assert_eq!(invocation.option("persona_id"), Some("pirate"));
        assert_eq!(invocation.option("name"), None);
        assert!(invocation.required_option("name").is_err());
    }

    #[test]
    fn test_errors_become_private_replies() {
        let reply = CommandReply::from(BotError::UnknownId("ghost".into()));
        assert!(reply.ephemeral);
        assert!(reply.content.contains("ghost"));
    }
}
