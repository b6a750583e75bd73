//! # Feature: Persona Store
//!
//! Runtime-editable persona registry mirrored to a JSON overlay file. The
//! `default` persona always exists; its prompt can come from a separate text
//! file and it cannot be edited or deleted through commands.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::sources::{DefaultPromptSource, OverlaySource, SourceError};
use crate::core::BotError;

pub const DEFAULT_PERSONA_ID: &str = "default";

/// Prompt used when neither the prompt file nor the overlay provides one
pub const FALLBACK_PROMPT: &str = "You are a basic AI assistant.";

/// Persona id -> persona. Sorted so listings and the overlay file are stable.
pub type Registry = BTreeMap<String, Persona>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Registry key; not written into the overlay record
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prompt: String,
}

impl Persona {
    pub fn new(id: &str, name: &str, description: &str, prompt: &str) -> Self {
        Persona {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            prompt: prompt.to_string(),
        }
    }

    /// Name for display, falling back to the id when the name is blank
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Overlay record for `default`: only fields that are present get merged
#[derive(Debug, Default, Deserialize)]
struct DefaultOverride {
    name: Option<String>,
    description: Option<String>,
    prompt: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonaField {
    Name,
    Description,
    Prompt,
}

impl fmt::Display for PersonaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersonaField::Name => write!(f, "name"),
            PersonaField::Description => write!(f, "description"),
            PersonaField::Prompt => write!(f, "prompt"),
        }
    }
}

/// Requested changes for an edit; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonaEdit {
    pub name: Option<String>,
    pub description: Option<String>,
    pub prompt: Option<String>,
}

impl PersonaEdit {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.prompt.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Nothing was supplied; nothing was saved
    Unchanged,
    Changed(Vec<PersonaField>),
}

impl EditOutcome {
    pub fn prompt_changed(&self) -> bool {
        matches!(self, EditOutcome::Changed(fields) if fields.contains(&PersonaField::Prompt))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPersona {
    pub persona: Persona,
    /// True when no prompt was given and the default prompt was copied
    pub inherited_default_prompt: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedPersona {
    pub id: String,
    pub name: String,
}

/// Letters, digits and underscores, with at least one letter or digit
pub fn is_valid_persona_id(id: &str) -> bool {
    id.chars().any(char::is_alphanumeric) && id.chars().all(|c| c.is_alphanumeric() || c == '_')
}

pub struct PersonaStore {
    personas: Registry,
    overlay: Box<dyn OverlaySource>,
}

impl PersonaStore {
    /// Load the registry: built-in default, then the prompt file, then the overlay.
    ///
    /// Never fails. A malformed overlay is logged and ignored; a missing one is
    /// created on the spot with just the default persona.
    pub fn load(
        overlay: Box<dyn OverlaySource>,
        prompt_source: &dyn DefaultPromptSource,
        assistant_name: &str,
    ) -> Self {
        info!("Loading personas...");

        let mut default = Persona::new(
            DEFAULT_PERSONA_ID,
            &format!("{assistant_name} (Default)"),
            "Base",
            FALLBACK_PROMPT,
        );
        match prompt_source.read().map(|text| text.trim().to_string()) {
            Some(prompt) if !prompt.is_empty() => {
                default.prompt = prompt;
                info!("Default prompt loaded from prompt source");
            }
            Some(_) => warn!("Default prompt source is empty, keeping fallback prompt"),
            None => warn!("No default prompt source, keeping fallback prompt"),
        }

        let mut store = PersonaStore {
            personas: Registry::from([(DEFAULT_PERSONA_ID.to_string(), default)]),
            overlay,
        };

        match store.overlay.load() {
            Ok(Some(value)) => store.merge_overlay(value),
            Ok(None) => {
                info!(
                    "{} not found, creating it with the default persona only",
                    store.overlay.describe()
                );
                if let Err(e) = store.save() {
                    error!("Bootstrap save failed: {e}");
                }
            }
            Err(SourceError::Parse(e)) => {
                error!("Invalid JSON in {}: {e}", store.overlay.describe());
            }
            Err(e) => error!("Failed to load {}: {e}", store.overlay.describe()),
        }

        info!(
            "Personas after load: {:?}",
            store.personas.keys().collect::<Vec<_>>()
        );
        store
    }

    fn merge_overlay(&mut self, value: serde_json::Value) {
        let serde_json::Value::Object(entries) = value else {
            warn!(
                "{} is not a JSON object, ignoring it",
                self.overlay.describe()
            );
            return;
        };

        let mut merged = 0;
        for (id, record) in entries {
            if !record.is_object() {
                warn!("Skipping persona '{id}': record is not an object");
                continue;
            }

            if id == DEFAULT_PERSONA_ID {
                let Ok(patch) = serde_json::from_value::<DefaultOverride>(record) else {
                    warn!("Skipping overlay 'default': fields must be strings");
                    continue;
                };
                let Some(default) = self.personas.get_mut(DEFAULT_PERSONA_ID) else {
                    continue;
                };
                if let Some(name) = patch.name {
                    default.name = name;
                }
                if let Some(description) = patch.description {
                    default.description = description;
                }
                match patch.prompt {
                    Some(prompt) if !prompt.is_empty() => default.prompt = prompt,
                    _ => {}
                }
                continue;
            }

            match serde_json::from_value::<Persona>(record) {
                Ok(mut persona) => {
                    persona.id = id.clone();
                    self.personas.insert(id, persona);
                    merged += 1;
                }
                Err(e) => warn!("Skipping persona '{id}': {e}"),
            }
        }

        info!(
            "{merged} (+default) personas loaded from {}",
            self.overlay.describe()
        );
    }

    /// Write the whole registry to the overlay
    pub fn save(&self) -> Result<(), BotError> {
        Self::persist(self.overlay.as_ref(), &self.personas)
    }

    fn persist(overlay: &dyn OverlaySource, registry: &Registry) -> Result<(), BotError> {
        overlay.store(registry).map_err(|e| {
            error!("Saving personas to {} failed: {e}", overlay.describe());
            BotError::PersistenceFailure(e.to_string())
        })
    }

    /// Persist a staged registry and only then make it the live one
    fn commit(&mut self, staged: Registry) -> Result<(), BotError> {
        Self::persist(self.overlay.as_ref(), &staged)?;
        self.personas = staged;
        info!(
            "Personas saved. Current keys: {:?}",
            self.personas.keys().collect::<Vec<_>>()
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.personas.contains_key(id)
    }

    pub fn list(&self) -> impl Iterator<Item = &Persona> {
        self.personas.values()
    }

    pub fn ids(&self) -> Vec<String> {
        self.personas.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }

    /// The mandatory default persona
    pub fn default_persona(&self) -> Option<&Persona> {
        self.personas.get(DEFAULT_PERSONA_ID)
    }

    pub fn create(
        &mut self,
        id: &str,
        name: &str,
        description: &str,
        prompt: Option<&str>,
    ) -> Result<CreatedPersona, BotError> {
        if self.personas.contains_key(id) {
            return Err(BotError::DuplicateId(id.to_string()));
        }
        if !is_valid_persona_id(id) {
            return Err(BotError::InvalidId(id.to_string()));
        }

        let supplied = prompt.map(str::trim).filter(|p| !p.is_empty());
        let inherited_default_prompt = supplied.is_none();
        let prompt = match supplied {
            Some(p) => p.to_string(),
            None => self
                .default_persona()
                .map(|p| p.prompt.clone())
                .unwrap_or_else(|| FALLBACK_PROMPT.to_string()),
        };

        let persona = Persona::new(id, name, description, &prompt);
        let mut staged = self.personas.clone();
        staged.insert(id.to_string(), persona.clone());
        self.commit(staged)?;

        info!("Persona '{id}' created");
        Ok(CreatedPersona {
            persona,
            inherited_default_prompt,
        })
    }

    pub fn edit(&mut self, id: &str, edit: PersonaEdit) -> Result<EditOutcome, BotError> {
        if !self.personas.contains_key(id) {
            return Err(BotError::UnknownId(id.to_string()));
        }
        if id == DEFAULT_PERSONA_ID {
            return Err(BotError::ProtectedId(id.to_string()));
        }
        if edit.is_empty() {
            return Ok(EditOutcome::Unchanged);
        }

        let mut staged = self.personas.clone();
        let persona = staged
            .get_mut(id)
            .ok_or_else(|| BotError::UnknownId(id.to_string()))?;

        let mut fields = Vec::new();
        if let Some(name) = edit.name {
            persona.name = name;
            fields.push(PersonaField::Name);
        }
        if let Some(description) = edit.description {
            persona.description = description;
            fields.push(PersonaField::Description);
        }
        if let Some(prompt) = edit.prompt {
            persona.prompt = prompt.trim().to_string();
            fields.push(PersonaField::Prompt);
        }

        self.commit(staged)?;
        info!(
            "Persona '{id}' edited: {}",
            fields
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(EditOutcome::Changed(fields))
    }

    pub fn delete(&mut self, id: &str) -> Result<DeletedPersona, BotError> {
        let Some(existing) = self.personas.get(id) else {
            return Err(BotError::UnknownId(id.to_string()));
        };
        if id == DEFAULT_PERSONA_ID {
            return Err(BotError::ProtectedId(id.to_string()));
        }

        let deleted = DeletedPersona {
            id: id.to_string(),
            name: existing.display_name().to_string(),
        };
        let mut staged = self.personas.clone();
        staged.remove(id);
        self.commit(staged)?;

        info!("Persona '{id}' deleted");
        Ok(deleted)
    }
}
