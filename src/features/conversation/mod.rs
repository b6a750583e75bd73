//! # Feature: Conversation
//!
//! One shared memory for the whole bot: the active persona, a bounded
//! history of exchanges and an inactivity timeout that puts everything back
//! to `default`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Context switching, timeout reset, prompt assembly

pub mod context;
pub mod policy;
pub mod prompt;

pub use context::{Clock, ConversationContext, Role, SystemClock, Turn, EMPTY_HISTORY_MARKER};
pub use policy::{
    Assistant, AssistantSettings, ContextStatus, Decision, DeleteReport, EditReport,
    SharedAssistant, FAILURE_MESSAGE,
};
pub use prompt::PromptBuilder;
