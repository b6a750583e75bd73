//! Command handler registry
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use log::warn;
use std::collections::HashMap;
use std::sync::Arc;

use super::context::CommandContext;
use super::handler::{CommandInvocation, CommandReply, SlashCommandHandler};

/// Registry mapping command names to handlers
///
/// Multiple command names can map to the same handler if they share logic.
///
/// # Example
///
/// ```ignore
/// let mut registry = CommandRegistry::new();
/// registry.register(Arc::new(UtilityHandler));
///
/// let reply = registry.dispatch(ctx, &invocation).await?;
/// ```
#[derive(Clone)]
pub struct CommandRegistry {
    handlers: HashMap<&'static str, Arc<dyn SlashCommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for all names returned by `command_names()`
    pub fn register(&mut self, handler: Arc<dyn SlashCommandHandler>) {
        for name in handler.command_names() {
            self.handlers.insert(name, Arc::clone(&handler));
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SlashCommandHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered command names (not unique handlers)
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn command_names(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }

    /// Route an invocation to its handler
    pub async fn dispatch(
        &self,
        ctx: Arc<CommandContext>,
        invocation: &CommandInvocation,
    ) -> Result<CommandReply> {
        match self.get(&invocation.name) {
            Some(handler) => handler.handle(ctx, invocation).await,
            None => {
                warn!("No handler registered for /{}", invocation.name);
                Ok(CommandReply::private(format!(
                    "Unknown command: /{}",
                    invocation.name
                )))
            }
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::tests::test_context;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct MockHandler {
        names: &'static [&'static str],
    }

    #[async_trait]
    impl SlashCommandHandler for MockHandler {
        fn command_names(&self) -> &'static [&'static str] {
            self.names
        }

        async fn handle(
            &self,
            _ctx: Arc<CommandContext>,
            invocation: &CommandInvocation,
        ) -> Result<CommandReply> {
            Ok(CommandReply::public(format!("handled {}", invocation.name)))
        }
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = CommandRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registry_register_multiple_names() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(MockHandler {
            names: &["persona_set", "persona_edit"],
        }));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("persona_set"));
        assert!(registry.contains("persona_edit"));
        assert!(!registry.contains("ping"));
        assert!(registry.get("missing").is_none());
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_name() {
        let dir = tempdir().unwrap();
        let ctx = test_context(dir.path());
        let mut registry = CommandRegistry::default();
        registry.register(Arc::new(MockHandler { names: &["ping"] }));

        let reply = registry
            .dispatch(ctx.clone(), &CommandInvocation::new("ping"))
            .await
            .unwrap();
        assert_eq!(reply, CommandReply::public("handled ping"));

        let reply = registry
            .dispatch(ctx, &CommandInvocation::new("nope"))
            .await
            .unwrap();
        assert!(reply.ephemeral);
    }
}
