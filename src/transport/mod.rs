//! # Transport Layer
//!
//! Platform-neutral shapes for inbound messages and outbound replies. The
//! conversation core only sees these; `discord` adapts serenity to them.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod discord;

use anyhow::Result;
use async_trait::async_trait;

/// A chat message as seen by the conversation core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub message_id: u64,
    pub channel_id: u64,
    pub author_name: String,
    pub content: String,
    /// The message mentions the assistant
    pub addressed: bool,
    /// The assistant's own user id, used to strip mention tokens
    pub assistant_user_id: u64,
}

impl InboundMessage {
    /// Content with the assistant's mention tokens removed and trimmed
    pub fn strip_address(&self) -> String {
        strip_address(&self.content, self.assistant_user_id)
    }
}

/// Remove `<@id>` and `<@!id>` mentions of `user_id` from `text`
pub fn strip_address(text: &str, user_id: u64) -> String {
    text.replace(&format!("<@!{user_id}>"), "")
        .replace(&format!("<@{user_id}>"), "")
        .trim()
        .to_string()
}

/// Where replies go. Splitting long text to platform limits is the sink's job.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, channel_id: u64, text: &str) -> Result<()>;

    /// Answer `message` directly (threaded reply where the platform has one)
    async fn reply(&self, message: &InboundMessage, text: &str) -> Result<()>;

    /// Show a "typing" indicator while the model works
    async fn typing(&self, _channel_id: u64) -> Result<()> {
        Ok(())
    }
}
