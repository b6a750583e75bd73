//! Persona command handlers
//!
//! Handles: personas, persona_set, persona_create, persona_edit,
//! persona_delete, forget, context
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Add forget and context
//! - 1.0.0: Listing, switching and editing personas at runtime

use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandInvocation, CommandReply, SlashCommandHandler};
use crate::core::BotError;
use crate::features::personas::{EditOutcome, PersonaEdit};

/// Handler for persona management and memory commands
pub struct PersonaHandler;

#[async_trait]
impl SlashCommandHandler for PersonaHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &[
            "personas",
            "persona_set",
            "persona_create",
            "persona_edit",
            "persona_delete",
            "forget",
            "context",
        ]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        invocation: &CommandInvocation,
    ) -> Result<CommandReply> {
        info!("/{} received from {}", invocation.name, invocation.user);

        let reply = match invocation.name.as_str() {
            "personas" => self.handle_personas(&ctx).await,
            "persona_set" => self.handle_set(&ctx, invocation).await?,
            "persona_create" => self.handle_create(&ctx, invocation).await?,
            "persona_edit" => self.handle_edit(&ctx, invocation).await?,
            "persona_delete" => self.handle_delete(&ctx, invocation).await?,
            "forget" => self.handle_forget(&ctx).await,
            "context" => self.handle_context(&ctx).await,
            other => CommandReply::private(format!("Unknown command: /{other}")),
        };
        Ok(reply)
    }
}

/// Log a domain failure and turn it into an ephemeral reply
fn rejected(command: &str, error: BotError) -> CommandReply {
    warn!("/{command} rejected: {error}");
    CommandReply::from(error)
}

impl PersonaHandler {
    /// Handle /personas - list personas with the active one marked
    async fn handle_personas(&self, ctx: &CommandContext) -> CommandReply {
        let assistant = ctx.assistant.lock().await;
        let status = assistant.status();

        let mut response = format!(
            "**Personas** (active: **{}** `{}`)\n",
            status.active_persona_name, status.active_persona_id
        );
        for persona in assistant.store().list() {
            let marker = if persona.id == status.active_persona_id {
                "▶"
            } else {
                "•"
            };
            let description = if persona.description.is_empty() {
                "N/A"
            } else {
                persona.description.as_str()
            };
            response.push_str(&format!(
                "{marker} **{}** (`{}`) - {description}\n",
                persona.display_name(),
                persona.id
            ));
        }
        CommandReply::public(response)
    }

    /// Handle /persona_set - switch persona, always with a fresh memory
    async fn handle_set(
        &self,
        ctx: &CommandContext,
        invocation: &CommandInvocation,
    ) -> Result<CommandReply> {
        let id = invocation.required_option("persona_id")?.trim();
        let mut assistant = ctx.assistant.lock().await;

        Ok(match assistant.set_active(id) {
            Ok(persona) => CommandReply::public(format!(
                "OK. Persona -> **{}** ({id}).\n*Conversation memory reset.*",
                persona.display_name()
            )),
            Err(e) => rejected(&invocation.name, e),
        })
    }

    /// Handle /persona_create
    async fn handle_create(
        &self,
        ctx: &CommandContext,
        invocation: &CommandInvocation,
    ) -> Result<CommandReply> {
        let id = invocation.required_option("persona_id")?.trim();
        let name = invocation.required_option("name")?;
        let description = invocation.required_option("description")?;
        let prompt = invocation.option("prompt");

        let mut assistant = ctx.assistant.lock().await;
        Ok(match assistant.create_persona(id, name, description, prompt) {
            Ok(created) => {
                let prompt_note = if created.inherited_default_prompt {
                    "Default prompt used."
                } else {
                    "Prompt provided."
                };
                CommandReply::public(format!(
                    "Persona '{}' ({id}) created. {prompt_note}",
                    created.persona.display_name()
                ))
            }
            Err(e) => rejected(&invocation.name, e),
        })
    }

    /// Handle /persona_edit - only supplied fields change
    async fn handle_edit(
        &self,
        ctx: &CommandContext,
        invocation: &CommandInvocation,
    ) -> Result<CommandReply> {
        let id = invocation.required_option("persona_id")?.trim();
        let edit = PersonaEdit {
            name: invocation.option("name").map(str::to_string),
            description: invocation.option("description").map(str::to_string),
            prompt: invocation.option("prompt").map(str::to_string),
        };

        let mut assistant = ctx.assistant.lock().await;
        let report = match assistant.edit_persona(id, edit) {
            Ok(report) => report,
            Err(e) => return Ok(rejected(&invocation.name, e)),
        };

        Ok(match report.outcome {
            EditOutcome::Unchanged => CommandReply::private("No changes specified."),
            EditOutcome::Changed(fields) => {
                let fields = fields
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                let reset_note = if report.context_reset {
                    "\n*Memory reset because the active prompt changed.*"
                } else {
                    ""
                };
                CommandReply::public(format!("OK. '{id}' updated: {fields}.{reset_note}"))
            }
        })
    }

    /// Handle /persona_delete - `default` is protected
    async fn handle_delete(
        &self,
        ctx: &CommandContext,
        invocation: &CommandInvocation,
    ) -> Result<CommandReply> {
        let id = invocation.required_option("persona_id")?.trim();
        let mut assistant = ctx.assistant.lock().await;

        Ok(match assistant.delete_persona(id) {
            Ok(report) => {
                let reset_note = if report.was_active {
                    "\nIt was the active persona: back to 'default' with a fresh memory."
                } else {
                    ""
                };
                CommandReply::public(format!(
                    "Persona '{}' ({}) deleted.{reset_note}",
                    report.deleted.name, report.deleted.id
                ))
            }
            Err(e) => rejected(&invocation.name, e),
        })
    }

    /// Handle /forget - wipe history, keep persona
    async fn handle_forget(&self, ctx: &CommandContext) -> CommandReply {
        let mut assistant = ctx.assistant.lock().await;
        assistant.forget();
        let status = assistant.status();
        CommandReply::public(format!(
            "Conversation memory cleared. Still talking as **{}**.",
            status.active_persona_name
        ))
    }

    /// Handle /context - show what the assistant currently remembers
    async fn handle_context(&self, ctx: &CommandContext) -> CommandReply {
        let assistant = ctx.assistant.lock().await;
        let status = assistant.status();
        let timeout_minutes = assistant.settings().context_timeout.num_minutes();

        let last = match status.last_interaction {
            Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => "never".to_string(),
        };
        CommandReply::private(format!(
            "**Context**\n\
            Persona: **{}** (`{}`)\n\
            Memory: {}/{} turns\n\
            Last interaction: {last}\n\
            Resets after {timeout_minutes} min of silence\n\
            Personas available: {}",
            status.active_persona_name,
            status.active_persona_id,
            status.history_len,
            status.max_history,
            status.persona_count
        ))
    }
}
