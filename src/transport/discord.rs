//! Discord adapter: serenity messages in, chunked replies out
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serenity::http::Http;
use serenity::model::application::interaction::application_command::{
    ApplicationCommandInteraction, CommandDataOption,
};
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, MessageId, UserId};
use std::collections::HashMap;
use std::sync::Arc;

use super::{InboundMessage, ReplySink};
use crate::commands::{CommandInvocation, CommandReply};
use crate::core::chunk_for_message;

/// Reply sink writing through the Discord REST client
#[derive(Clone)]
pub struct DiscordSink {
    http: Arc<Http>,
}

impl DiscordSink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ReplySink for DiscordSink {
    async fn send(&self, channel_id: u64, text: &str) -> Result<()> {
        let channel = ChannelId(channel_id);
        for chunk in chunk_for_message(text) {
            channel.say(&self.http, &chunk).await?;
        }
        Ok(())
    }

    async fn reply(&self, message: &InboundMessage, text: &str) -> Result<()> {
        let channel = ChannelId(message.channel_id);
        let chunks = chunk_for_message(text);
        debug!("📤 Replying in {} chunk(s)", chunks.len());

        // First chunk as threaded reply, the rest as plain messages
        let mut chunks = chunks.into_iter();
        if let Some(first) = chunks.next() {
            let reference = (channel, MessageId(message.message_id));
            channel
                .send_message(&self.http, |m| m.content(first).reference_message(reference))
                .await?;
        }
        for chunk in chunks {
            channel.say(&self.http, &chunk).await?;
        }
        Ok(())
    }

    async fn typing(&self, channel_id: u64) -> Result<()> {
        ChannelId(channel_id).broadcast_typing(&self.http).await?;
        Ok(())
    }
}

/// Adapt a gateway message; `addressed` when it mentions `bot_id`.
/// The author is named by their server nickname when they have one.
pub fn inbound_from_message(msg: &Message, bot_id: UserId) -> InboundMessage {
    InboundMessage {
        message_id: msg.id.0,
        channel_id: msg.channel_id.0,
        author_name: msg
            .member
            .as_ref()
            .and_then(|member| member.nick.clone())
            .unwrap_or_else(|| msg.author.name.clone()),
        content: msg.content.clone(),
        addressed: msg.mentions.iter().any(|user| user.id == bot_id),
        assistant_user_id: bot_id.0,
    }
}

/// Flatten slash command options into name -> string value
pub fn options_to_map(options: &[CommandDataOption]) -> HashMap<String, String> {
    options
        .iter()
        .filter_map(|opt| {
            let value = opt.value.as_ref()?;
            let text = match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            };
            Some((opt.name.clone(), text))
        })
        .collect()
}

pub fn invocation_from_command(
    command: &ApplicationCommandInteraction,
    latency: Option<std::time::Duration>,
) -> CommandInvocation {
    CommandInvocation {
        name: command.data.name.clone(),
        options: options_to_map(&command.data.options),
        user: command.user.name.clone(),
        latency,
    }
}

/// Acknowledge a slash command before it waits on the assistant.
///
/// Discord drops interactions not answered within three seconds, and a
/// command may queue behind a model call for much longer than that.
pub async fn defer_command(http: &Http, command: &ApplicationCommandInteraction) -> Result<()> {
    command
        .create_interaction_response(http, |response| {
            response.kind(InteractionResponseType::DeferredChannelMessageWithSource)
        })
        .await?;
    Ok(())
}

/// One call needed to turn a deferred interaction into the final reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStep {
    EditOriginal(String),
    /// A public deferral cannot become private; drop it and follow up instead
    DeleteOriginal,
    Followup { content: String, ephemeral: bool },
}

/// Steps delivering `reply` over a public deferred response
pub fn delivery_steps(reply: &CommandReply) -> Vec<DeliveryStep> {
    let mut chunks = chunk_for_message(&reply.content);
    if chunks.is_empty() {
        chunks.push("Done.".to_string());
    }

    let mut steps = Vec::with_capacity(chunks.len() + 1);
    let mut chunks = chunks.into_iter();
    if reply.ephemeral {
        steps.push(DeliveryStep::DeleteOriginal);
    } else if let Some(first) = chunks.next() {
        steps.push(DeliveryStep::EditOriginal(first));
    }
    steps.extend(chunks.map(|content| DeliveryStep::Followup {
        content,
        ephemeral: reply.ephemeral,
    }));
    steps
}

/// Replace the deferred placeholder with `reply`, spilling long content into follow-ups
pub async fn deliver_command_reply(
    http: &Http,
    command: &ApplicationCommandInteraction,
    reply: &CommandReply,
) -> Result<()> {
    for step in delivery_steps(reply) {
        match step {
            DeliveryStep::EditOriginal(content) => {
                command
                    .edit_original_interaction_response(http, |response| response.content(content))
                    .await?;
            }
            DeliveryStep::DeleteOriginal => {
                command.delete_original_interaction_response(http).await?;
            }
            DeliveryStep::Followup { content, ephemeral } => {
                command
                    .create_followup_message(http, |followup| {
                        followup.content(content).ephemeral(ephemeral)
                    })
                    .await?;
            }
        }
    }
    Ok(())
}
