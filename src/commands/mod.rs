//! # Command System
//!
//! Slash command (/) handling, independent of the Discord client: handlers
//! take a [`CommandInvocation`] and return a [`CommandReply`].
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod context;
pub mod handler;
pub mod handlers;
pub mod registry;
pub mod slash;

pub use context::CommandContext;
pub use handler::{CommandInvocation, CommandReply, SlashCommandHandler};
pub use handlers::{create_all_handlers, create_registry};
pub use registry::CommandRegistry;

pub use slash::{
    create_slash_commands, get_focused_option, register_global_commands,
    register_guild_commands, PERSONA_AUTOCOMPLETE_COMMANDS,
};
