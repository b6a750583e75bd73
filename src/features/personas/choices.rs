//! Persona suggestions for slash command autocomplete
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use super::store::PersonaStore;

/// Discord caps autocomplete responses at 25 choices
pub const MAX_CHOICES: usize = 25;

/// Choices as `(label, id)` for personas whose id or name contains `partial`
/// (case-insensitive), ids that start with it ranked first.
pub fn persona_choices(store: &PersonaStore, partial: &str) -> Vec<(String, String)> {
    let needle = partial.trim().to_lowercase();

    let mut matches: Vec<_> = store
        .list()
        .filter(|p| {
            needle.is_empty()
                || p.id.to_lowercase().contains(&needle)
                || p.name.to_lowercase().contains(&needle)
        })
        .collect();
    matches.sort_by_key(|p| !p.id.to_lowercase().starts_with(&needle));

    matches
        .into_iter()
        .take(MAX_CHOICES)
        .map(|p| (format!("{} ({})", p.display_name(), p.id), p.id.clone()))
        .collect()
}
