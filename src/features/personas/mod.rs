//! # Personas Feature
//!
//! Named prompt templates that can be listed, created, edited and deleted at
//! runtime, persisted to a JSON overlay file.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod choices;
pub mod sources;
pub mod store;

pub use choices::{persona_choices, MAX_CHOICES};
pub use sources::{DefaultPromptSource, JsonFileOverlay, OverlaySource, PromptFile, SourceError};
pub use store::{
    is_valid_persona_id, CreatedPersona, DeletedPersona, EditOutcome, Persona, PersonaEdit,
    PersonaField, PersonaStore, Registry, DEFAULT_PERSONA_ID, FALLBACK_PROMPT,
};
