//! Backing sources for the persona registry: the JSON overlay file and the
//! plain-text default prompt.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::store::Registry;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("overlay is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("overlay I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Mutable document holding every persona, keyed by id.
///
/// `load` yields `Ok(None)` when the document does not exist yet.
pub trait OverlaySource: Send + Sync {
    fn load(&self) -> Result<Option<serde_json::Value>, SourceError>;
    fn store(&self, registry: &Registry) -> Result<(), SourceError>;
    fn describe(&self) -> String;
}

/// Single text blob with the default persona's prompt. Absence is tolerated.
pub trait DefaultPromptSource: Send + Sync {
    fn read(&self) -> Option<String>;
}

/// Overlay stored as a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonFileOverlay {
    path: PathBuf,
}

impl JsonFileOverlay {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OverlaySource for JsonFileOverlay {
    fn load(&self) -> Result<Option<serde_json::Value>, SourceError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn store(&self, registry: &Registry) -> Result<(), SourceError> {
        let json = serde_json::to_string_pretty(registry)?;
        fs::write(&self.path, json)?;
        debug!("Wrote {} personas to {}", registry.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Default prompt read from a text file such as `prompt.txt`
#[derive(Debug, Clone)]
pub struct PromptFile {
    path: PathBuf,
}

impl PromptFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DefaultPromptSource for PromptFile {
    fn read(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("{} not found", self.path.display());
                None
            }
            Err(e) => {
                warn!("Failed to read {}: {e}", self.path.display());
                None
            }
        }
    }
}

/// No default prompt source configured
impl DefaultPromptSource for () {
    fn read(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::personas::store::Persona;
    use tempfile::tempdir;

    #[test]
    fn test_missing_overlay_is_none() {
        let dir = tempdir().unwrap();
        let overlay = JsonFileOverlay::new(dir.path().join("personas.json"));
        assert!(overlay.load().unwrap().is_none());
    }

    #[test]
    fn test_garbage_overlay_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("personas.json");
        fs::write(&path, "{ not json").unwrap();

        let overlay = JsonFileOverlay::new(&path);
        assert!(matches!(overlay.load(), Err(SourceError::Parse(_))));
    }

    #[test]
    fn test_store_then_load_keeps_schema() {
        let dir = tempdir().unwrap();
        let overlay = JsonFileOverlay::new(dir.path().join("personas.json"));

        let mut registry = Registry::new();
        registry.insert(
            "pirate".to_string(),
            Persona::new("pirate", "Pirate", "Arr", "Talk like a pirate."),
        );
        overlay.store(&registry).unwrap();

        let value = overlay.load().unwrap().unwrap();
        assert_eq!(value["pirate"]["name"], "Pirate");
        assert_eq!(value["pirate"]["prompt"], "Talk like a pirate.");
        // id is the key, not a field
        assert!(value["pirate"].get("id").is_none());
    }

    #[test]
    fn test_store_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let overlay = JsonFileOverlay::new(dir.path().join("nope").join("personas.json"));
        assert!(matches!(
            overlay.store(&Registry::new()),
            Err(SourceError::Io(_))
        ));
    }

    #[test]
    fn test_prompt_file_absent_is_tolerated() {
        let dir = tempdir().unwrap();
        assert!(PromptFile::new(dir.path().join("prompt.txt")).read().is_none());
        assert!(().read().is_none());
    }
}
