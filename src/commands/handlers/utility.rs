//! Utility command handlers
//!
//! Handles: help, ping
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandInvocation, CommandReply, SlashCommandHandler};

pub const HELP_TEXT: &str = "**Available Commands:**
`/help` - Show this help message
`/ping` - Check the bot's latency
`/personas` - List the available personas
`/persona_set` - Change the active persona
`/persona_create` - Create a new persona
`/persona_edit` - Change a persona's name, description or prompt
`/persona_delete` - Delete a persona
`/forget` - Clear the conversation memory
`/context` - Show the active persona and memory usage

Mention me (or talk in my channel) to chat with the active persona.";

/// Handler for utility commands: help, ping
pub struct UtilityHandler;

#[async_trait]
impl SlashCommandHandler for UtilityHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["help", "ping"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        invocation: &CommandInvocation,
    ) -> Result<CommandReply> {
        match invocation.name.as_str() {
            "help" => Ok(CommandReply::public(HELP_TEXT)),
            "ping" => Ok(self.handle_ping(&ctx, invocation)),
            other => Ok(CommandReply::private(format!("Unknown command: /{other}"))),
        }
    }
}

impl UtilityHandler {
    fn handle_ping(&self, ctx: &CommandContext, invocation: &CommandInvocation) -> CommandReply {
        let uptime = ctx.start_time.elapsed().as_secs();
        let latency = match invocation.latency {
            Some(latency) => format!("{}ms", latency.as_millis()),
            None => "unknown".to_string(),
        };

        info!("Ping command completed for user {}", invocation.user);
        CommandReply::public(format!(
            "Pong! Latency: {latency}. Uptime: {}h {}m {}s",
            uptime / 3600,
            (uptime % 3600) / 60,
            uptime % 60
        ))
    }
}
