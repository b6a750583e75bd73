//! Per-command handler implementations
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

pub mod persona;
pub mod utility;

use std::sync::Arc;

use super::handler::SlashCommandHandler;
use super::registry::CommandRegistry;

/// Create all registered command handlers
pub fn create_all_handlers() -> Vec<Arc<dyn SlashCommandHandler>> {
    vec![
        Arc::new(utility::UtilityHandler),
        Arc::new(persona::PersonaHandler),
    ]
}

/// Registry with every handler registered
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for handler in create_all_handlers() {
        registry.register(handler);
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::slash::create_slash_commands;

    #[test]
    fn test_every_defined_command_has_a_handler() {
        let registry = create_registry();
        for command in create_slash_commands() {
            let name = command.0.get("name").unwrap().as_str().unwrap().to_string();
            assert!(registry.contains(&name), "no handler for /{name}");
        }
        assert_eq!(registry.len(), create_slash_commands().len());
    }
}
