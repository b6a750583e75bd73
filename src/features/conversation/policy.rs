//! # Feature: Conversation Policy
//!
//! Decides whether an inbound message gets an answer, which persona answers
//! it, when the memory is wiped, and how state changes after a model call.
//! Persona commands also go through here so switching, editing or deleting
//! the active persona resets the context consistently.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::context::{Clock, ConversationContext, SystemClock};
use super::prompt::PromptBuilder;
use crate::core::{BotError, Config};
use crate::features::model::{Generation, GenerativeModel};
use crate::features::personas::{
    CreatedPersona, DeletedPersona, EditOutcome, Persona, PersonaEdit, PersonaStore,
    DEFAULT_PERSONA_ID, FALLBACK_PROMPT,
};
use crate::transport::{InboundMessage, ReplySink};

/// Sent when the model call itself fails (network, API, timeout)
pub const FAILURE_MESSAGE: &str = "❌ Sorry, I encountered an error. Please try again later.";

/// The assistant behind a lock; every handler holds it for its whole run
pub type SharedAssistant = Arc<Mutex<Assistant>>;

#[derive(Debug, Clone)]
pub struct AssistantSettings {
    /// Label for the assistant's turns in history and the prompt
    pub assistant_name: String,
    pub context_timeout: chrono::Duration,
    pub max_history: usize,
    /// Channel answered without a mention
    pub always_listen_channel: Option<u64>,
}

impl AssistantSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            assistant_name: config.assistant_name.clone(),
            context_timeout: chrono::Duration::from_std(config.context_timeout)
                .unwrap_or_else(|_| chrono::Duration::max_value()),
            max_history: config.max_history,
            always_listen_channel: config.target_channel_id,
        }
    }
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            assistant_name: "Assistant".to_string(),
            context_timeout: chrono::Duration::minutes(2),
            max_history: 20,
            always_listen_channel: None,
        }
    }
}

/// What the policy decided for one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Not for us; nothing beyond the timeout check happened
    Ignored,
    Reply(String),
    Blocked,
    Unavailable,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditReport {
    pub outcome: EditOutcome,
    /// The edited persona was active and its prompt changed
    pub context_reset: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: DeletedPersona,
    /// The deleted persona was active; `default` took over
    pub was_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextStatus {
    pub active_persona_id: String,
    pub active_persona_name: String,
    pub history_len: usize,
    pub max_history: usize,
    pub last_interaction: Option<DateTime<Utc>>,
    pub persona_count: usize,
}

pub struct Assistant {
    store: PersonaStore,
    context: ConversationContext,
    settings: AssistantSettings,
    model: Option<Arc<dyn GenerativeModel>>,
    clock: Arc<dyn Clock>,
}

impl Assistant {
    pub fn new(
        store: PersonaStore,
        settings: AssistantSettings,
        model: Option<Arc<dyn GenerativeModel>>,
    ) -> Self {
        Self::with_clock(store, settings, model, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: PersonaStore,
        settings: AssistantSettings,
        model: Option<Arc<dyn GenerativeModel>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Assistant {
            store,
            context: ConversationContext::new(),
            settings,
            model,
            clock,
        }
    }

    pub fn into_shared(self) -> SharedAssistant {
        Arc::new(Mutex::new(self))
    }

    pub fn store(&self) -> &PersonaStore {
        &self.store
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    /// Apply the inactivity reset. True when the memory was wiped.
    pub fn check_timeout(&mut self) -> bool {
        let now = self.clock.now();
        let last = self.context.last_interaction();
        let reset = self
            .context
            .expire_if_idle(now, self.settings.context_timeout);
        if let (true, Some(last)) = (reset, last) {
            info!(
                "Inactivity detected ({}s), history and persona reset",
                (now - last).num_seconds()
            );
        }
        reset
    }

    /// Active persona, healing the context back to `default` if it vanished
    fn resolve_active_persona(&mut self) -> Option<Persona> {
        let active = self.context.active_persona_id().to_string();
        if let Some(persona) = self.store.get(&active) {
            return Some(persona.clone());
        }
        warn!(
            "Active persona '{active}' not found in {:?}, falling back to 'default'",
            self.store.ids()
        );
        self.context.heal_active();
        self.store.default_persona().cloned()
    }

    /// Run the message policy. The model call is the only suspension point.
    pub async fn on_inbound(&mut self, message: &InboundMessage, sink: &dyn ReplySink) -> Decision {
        let request_id = Uuid::new_v4();
        self.check_timeout();

        let addressed = message.addressed;
        let listening = self.settings.always_listen_channel == Some(message.channel_id);
        if !addressed && !listening {
            return Decision::Ignored;
        }

        let user_text = message.strip_address();
        if user_text.is_empty() {
            debug!("[{request_id}] Empty message after stripping mention, ignoring");
            return Decision::Ignored;
        }

        let Some(model) = self.model.clone() else {
            warn!("[{request_id}] No model client available");
            return Decision::Unavailable;
        };

        let persona = self.resolve_active_persona();
        let persona_id = self.context.active_persona_id().to_string();
        let persona_prompt = persona
            .map(|p| p.prompt)
            .unwrap_or_else(|| FALLBACK_PROMPT.to_string());
        info!("[{request_id}] 🎭 Answering with persona '{persona_id}'");

        let history = self.context.render_history(&self.settings.assistant_name);
        let prompt = PromptBuilder::new(&persona_prompt, &self.settings.assistant_name)
            .with_history(&history)
            .with_message(&message.author_name, &user_text)
            .build();
        debug!(
            "[{request_id}] 📝 Prompt ({} chars): {}...",
            prompt.len(),
            prompt.chars().take(300).collect::<String>()
        );

        if let Err(e) = sink.typing(message.channel_id).await {
            debug!("[{request_id}] Typing indicator failed: {e}");
        }

        match model.generate(&prompt).await {
            Generation::Text(reply) => {
                let now = self.clock.now();
                self.context.record_exchange(
                    &user_text,
                    &reply,
                    now,
                    self.settings.max_history,
                );
                info!(
                    "[{request_id}] ✅ Exchange recorded, history length {}",
                    self.context.history_len()
                );
                Decision::Reply(reply)
            }
            Generation::Blocked => {
                warn!("[{request_id}] 🚫 Model blocked or empty for '{user_text}'");
                Decision::Blocked
            }
            Generation::Failed(reason) => {
                warn!("[{request_id}] ❌ Model call failed: {reason}");
                Decision::Failed(reason)
            }
        }
    }

    /// Run the policy and deliver whatever it decided through `sink`
    pub async fn handle_message(
        &mut self,
        message: &InboundMessage,
        sink: &dyn ReplySink,
    ) -> Result<Decision> {
        let decision = self.on_inbound(message, sink).await;
        match &decision {
            Decision::Ignored => {}
            Decision::Reply(text) => sink.reply(message, text).await?,
            Decision::Blocked => {
                let text = BotError::ModelBlocked.user_message();
                sink.send(message.channel_id, &text).await?
            }
            Decision::Unavailable => {
                let text = BotError::ModelUnavailable("no client".into()).user_message();
                sink.send(message.channel_id, &text).await?
            }
            Decision::Failed(_) => sink.send(message.channel_id, FAILURE_MESSAGE).await?,
        }
        Ok(decision)
    }

    /// Switch persona. Prior memory is always discarded.
    pub fn set_active(&mut self, id: &str) -> Result<Persona, BotError> {
        let persona = self
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| BotError::UnknownId(id.to_string()))?;
        self.context.switch_to(id, self.clock.now());
        info!("Active persona -> '{id}', memory reset");
        Ok(persona)
    }

    /// Drop history but keep the persona
    pub fn forget(&mut self) {
        self.context.forget(self.clock.now());
        info!("Conversation memory cleared on request");
    }

    pub fn create_persona(
        &mut self,
        id: &str,
        name: &str,
        description: &str,
        prompt: Option<&str>,
    ) -> Result<CreatedPersona, BotError> {
        self.store.create(id, name, description, prompt)
    }

    pub fn edit_persona(&mut self, id: &str, edit: PersonaEdit) -> Result<EditReport, BotError> {
        let outcome = self.store.edit(id, edit)?;
        let context_reset = outcome.prompt_changed() && self.on_persona_prompt_edited(id);
        Ok(EditReport {
            outcome,
            context_reset,
        })
    }

    pub fn delete_persona(&mut self, id: &str) -> Result<DeleteReport, BotError> {
        let deleted = self.store.delete(id)?;
        let was_active = self.on_persona_deleted(id);
        Ok(DeleteReport {
            deleted,
            was_active,
        })
    }

    /// Fall back to `default` if the deleted persona was active
    pub fn on_persona_deleted(&mut self, id: &str) -> bool {
        if self.context.active_persona_id() != id {
            return false;
        }
        info!("Active persona '{id}' deleted, back to 'default'");
        self.context.switch_to(DEFAULT_PERSONA_ID, self.clock.now());
        true
    }

    /// Memory built against an old prompt is discarded
    pub fn on_persona_prompt_edited(&mut self, id: &str) -> bool {
        if self.context.active_persona_id() != id {
            return false;
        }
        info!("Active prompt of '{id}' changed, memory reset");
        self.context.forget(self.clock.now());
        true
    }

    pub fn status(&self) -> ContextStatus {
        let active_id = self.context.active_persona_id().to_string();
        let active_persona_name = self
            .store
            .get(&active_id)
            .map(|p| p.display_name().to_string())
            .unwrap_or_else(|| active_id.clone());
        ContextStatus {
            active_persona_id: active_id,
            active_persona_name,
            history_len: self.context.history_len(),
            max_history: self.settings.max_history,
            last_interaction: self.context.last_interaction(),
            persona_count: self.store.len(),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fakes shared by the policy and command tests

    use super::*;
    use crate::features::personas::JsonFileOverlay;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Mutex as StdMutex;

    pub struct ManualClock(StdMutex<DateTime<Utc>>);

    impl ManualClock {
        pub fn new() -> Arc<Self> {
            Arc::new(ManualClock(StdMutex::new(
                Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            )))
        }

        pub fn advance(&self, by: chrono::Duration) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    /// Replays scripted generations and remembers every prompt
    #[derive(Default)]
    pub struct ScriptedModel {
        script: StdMutex<VecDeque<Generation>>,
        pub prompts: StdMutex<Vec<String>>,
    }

    impl ScriptedModel {
        pub fn new(script: Vec<Generation>) -> Arc<Self> {
            Arc::new(ScriptedModel {
                script: StdMutex::new(script.into()),
                prompts: StdMutex::new(Vec::new()),
            })
        }

        pub fn last_prompt(&self) -> Option<String> {
            self.prompts.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str) -> Generation {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Generation::Failed("script exhausted".into()))
        }
    }

    /// Parks inside `generate` until released, to hold the lock mid-call
    pub struct GatedModel {
        reply: String,
        pub entered: tokio::sync::Notify,
        pub release: tokio::sync::Notify,
    }

    impl GatedModel {
        pub fn new(reply: &str) -> Arc<Self> {
            Arc::new(GatedModel {
                reply: reply.to_string(),
                entered: tokio::sync::Notify::new(),
                release: tokio::sync::Notify::new(),
            })
        }
    }

    #[async_trait]
    impl GenerativeModel for GatedModel {
        fn name(&self) -> &str {
            "gated"
        }

        async fn generate(&self, _prompt: &str) -> Generation {
            self.entered.notify_one();
            self.release.notified().await;
            Generation::Text(self.reply.clone())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Sent {
        Send(u64, String),
        Reply(u64, String),
        Typing(u64),
    }

    #[derive(Default)]
    pub struct RecordingSink {
        pub sent: StdMutex<Vec<Sent>>,
    }

    impl RecordingSink {
        pub fn outgoing(&self) -> Vec<Sent> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|s| !matches!(s, Sent::Typing(_)))
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl ReplySink for RecordingSink {
        async fn send(&self, channel_id: u64, text: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push(Sent::Send(channel_id, text.to_string()));
            Ok(())
        }

        async fn reply(&self, message: &InboundMessage, text: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push(Sent::Reply(message.message_id, text.to_string()));
            Ok(())
        }

        async fn typing(&self, channel_id: u64) -> Result<()> {
            self.sent.lock().unwrap().push(Sent::Typing(channel_id));
            Ok(())
        }
    }

    pub const BOT_ID: u64 = 42;
    pub const LISTEN_CHANNEL: u64 = 500;

    pub fn mention(text: &str) -> InboundMessage {
        InboundMessage {
            message_id: 1,
            channel_id: 100,
            author_name: "Alice".into(),
            content: format!("<@{BOT_ID}> {text}"),
            addressed: true,
            assistant_user_id: BOT_ID,
        }
    }

    pub fn chatter(channel_id: u64, text: &str) -> InboundMessage {
        InboundMessage {
            message_id: 2,
            channel_id,
            author_name: "Bob".into(),
            content: text.into(),
            addressed: false,
            assistant_user_id: BOT_ID,
        }
    }

    /// Store with `default` ("Base prompt") and `pirate` ("Talk like a pirate.")
    pub fn pirate_store(dir: &Path) -> PersonaStore {
        std::fs::write(dir.join("prompt.txt"), "Base prompt").unwrap();
        let mut store = PersonaStore::load(
            Box::new(JsonFileOverlay::new(dir.join("personas.json"))),
            &crate::features::personas::PromptFile::new(dir.join("prompt.txt")),
            "Droid",
        );
        store
            .create("pirate", "Pirate", "Arr", Some("Talk like a pirate."))
            .unwrap();
        store
    }

    pub fn settings() -> AssistantSettings {
        AssistantSettings {
            assistant_name: "Droid".into(),
            context_timeout: chrono::Duration::minutes(2),
            max_history: 20,
            always_listen_channel: Some(LISTEN_CHANNEL),
        }
    }
}
