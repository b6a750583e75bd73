//! Shared context for command handlers
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use log::debug;
use std::time::Instant;

use super::slash::PERSONA_AUTOCOMPLETE_COMMANDS;
use crate::features::conversation::SharedAssistant;
use crate::features::personas::persona_choices;

/// Shared context for all command handlers
///
/// - The assistant (persona store + conversation context) behind its lock
/// - Bot start time for uptime reporting
#[derive(Clone)]
pub struct CommandContext {
    pub assistant: SharedAssistant,
    pub start_time: Instant,
}

impl CommandContext {
    pub fn new(assistant: SharedAssistant) -> Self {
        Self::with_start_time(assistant, Instant::now())
    }

    /// Share the start time with the event handler
    pub fn with_start_time(assistant: SharedAssistant, start_time: Instant) -> Self {
        Self {
            assistant,
            start_time,
        }
    }

    /// Autocomplete for `persona_id`. Empty while a reply holds the assistant,
    /// since autocomplete must answer within Discord's deadline.
    pub fn persona_choices(&self, command: &str, option: &str, typed: &str) -> Vec<(String, String)> {
        if option != "persona_id" || !PERSONA_AUTOCOMPLETE_COMMANDS.contains(&command) {
            return Vec::new();
        }
        match self.assistant.try_lock() {
            Ok(assistant) => persona_choices(assistant.store(), typed),
            Err(_) => {
                debug!("Assistant busy, no autocomplete choices for '{command}'");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::commands::{create_registry, CommandInvocation};
    use crate::features::conversation::policy::testing::{
        chatter, pirate_store, settings, GatedModel, RecordingSink, LISTEN_CHANNEL,
    };
    use crate::features::conversation::Assistant;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::tempdir;

    /// Context over the pirate test store, without a model
    pub fn test_context(dir: &Path) -> Arc<CommandContext> {
        let assistant = Assistant::new(pirate_store(dir), settings(), None);
        Arc::new(CommandContext::new(assistant.into_shared()))
    }

    #[test]
    fn test_command_context_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<CommandContext>();
    }

    #[test]
    fn test_persona_choices_only_for_persona_id() {
        let dir = tempdir().unwrap();
        let ctx = test_context(dir.path());

        let choices = ctx.persona_choices("persona_set", "persona_id", "pir");
        assert_eq!(choices[0].1, "pirate");

        assert!(ctx.persona_choices("persona_create", "persona_id", "").is_empty());
        assert!(ctx.persona_choices("persona_edit", "name", "").is_empty());
    }

    #[tokio::test]
    async fn test_commands_during_generation() {
        let dir = tempdir().unwrap();
        let model = GatedModel::new("Ahoy");
        let assistant =
            Assistant::new(pirate_store(dir.path()), settings(), Some(model.clone())).into_shared();
        let ctx = Arc::new(CommandContext::new(assistant.clone()));

        let generation = tokio::spawn({
            let assistant = assistant.clone();
            async move {
                let sink = RecordingSink::default();
                let mut assistant = assistant.lock().await;
                assistant
                    .handle_message(&chatter(LISTEN_CHANNEL, "hi"), &sink)
                    .await
                    .unwrap()
            }
        });
        model.entered.notified().await;

        // Autocomplete answers at once instead of waiting for the reply
        assert!(ctx.persona_choices("persona_set", "persona_id", "").is_empty());

        // A command queues behind the reply and still gets its confirmation
        let command = tokio::spawn({
            let ctx = ctx.clone();
            async move {
                let invocation =
                    CommandInvocation::new("persona_set").with_option("persona_id", "pirate");
                create_registry().dispatch(ctx, &invocation).await.unwrap()
            }
        });
        tokio::task::yield_now().await;
        assert!(!command.is_finished());

        model.release.notify_one();
        generation.await.unwrap();
        let reply = command.await.unwrap();

        assert!(reply.content.contains("**Pirate** (pirate)"));
        assert_eq!(assistant.lock().await.context().active_persona_id(), "pirate");
        assert_eq!(ctx.persona_choices("persona_set", "persona_id", "").len(), 2);
    }
}
