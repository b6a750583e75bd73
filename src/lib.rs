// Core layer - configuration, errors, reply helpers
pub mod core;

// Features layer - personas, conversation policy, model clients
pub mod features;

// Transport layer - platform-neutral message types and the Discord adapter
pub mod transport;

// Application layer
pub mod commands;

pub use core::{BotError, Config};
pub use features::conversation::{Assistant, AssistantSettings, Decision, SharedAssistant};
pub use features::personas::{Persona, PersonaStore};
