// Personas - registry, persistence, autocomplete
pub mod personas;

// Conversation - context state machine and prompt assembly
pub mod conversation;

// Model - generation backends
pub mod model;

pub use conversation::{Assistant, AssistantSettings, Decision, SharedAssistant};
pub use model::{build_model, Generation, GenerativeModel};
pub use personas::{Persona, PersonaStore};
