use anyhow::Result;
use dotenvy::dotenv;
use log::{debug, error, info, warn};
use serenity::async_trait;
use serenity::client::bridge::gateway::{ShardId, ShardManager};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::autocomplete::AutocompleteInteraction;
use serenity::model::application::interaction::Interaction;
use serenity::model::channel::Message;
use serenity::model::gateway::{Activity, Ready};
use serenity::model::id::GuildId;
use serenity::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use persona_relay::commands::{
    create_registry, get_focused_option, register_global_commands, register_guild_commands,
    CommandContext, CommandRegistry,
};
use persona_relay::core::{Config, ModelProvider};
use persona_relay::features::conversation::{Assistant, AssistantSettings, SharedAssistant};
use persona_relay::features::model::build_model;
use persona_relay::features::personas::{JsonFileOverlay, PersonaStore, PromptFile};
use persona_relay::transport::discord::{
    defer_command, deliver_command_reply, inbound_from_message, invocation_from_command,
    DiscordSink,
};

/// Autocomplete labels are capped at 100 characters by Discord
const CHOICE_LABEL_LIMIT: usize = 100;

struct ShardManagerContainer;

impl TypeMapKey for ShardManagerContainer {
    type Value = Arc<Mutex<ShardManager>>;
}

struct Handler {
    assistant: SharedAssistant,
    command_ctx: Arc<CommandContext>,
    registry: CommandRegistry,
    guild_id: Option<GuildId>,
}

impl Handler {
    fn new(assistant: SharedAssistant, guild_id: Option<GuildId>) -> Self {
        Handler {
            command_ctx: Arc::new(CommandContext::new(assistant.clone())),
            assistant,
            registry: create_registry(),
            guild_id,
        }
    }

    /// Heartbeat latency of the shard that delivered the interaction
    async fn shard_latency(ctx: &Context) -> Option<Duration> {
        let data = ctx.data.read().await;
        let shard_manager = data.get::<ShardManagerContainer>()?;
        let manager = shard_manager.lock().await;
        let runners = manager.runners.lock().await;
        runners.get(&ShardId(ctx.shard_id)).and_then(|runner| runner.latency)
    }

    async fn handle_command(&self, ctx: &Context, command: &ApplicationCommandInteraction) {
        // Acknowledge first: the command may wait on a reply in progress
        if let Err(e) = defer_command(&ctx.http, command).await {
            error!("Failed to defer slash command '{}': {}", command.data.name, e);
            return;
        }

        let latency = Self::shard_latency(ctx).await;
        let invocation = invocation_from_command(command, latency);

        let result = match self
            .registry
            .dispatch(self.command_ctx.clone(), &invocation)
            .await
        {
            Ok(reply) => deliver_command_reply(&ctx.http, command, &reply).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            error!("Error handling slash command '{}': {}", command.data.name, e);
            let error_message =
                "❌ Sorry, I encountered an error processing your command. Please try again.";

            // Try to edit the deferred response, fallback to a follow-up if that fails
            if command
                .edit_original_interaction_response(&ctx.http, |response| {
                    response.content(error_message)
                })
                .await
                .is_err()
            {
                let _ = command
                    .create_followup_message(&ctx.http, |followup| {
                        followup.content(error_message).ephemeral(true)
                    })
                    .await;
            }
        }
    }

    async fn handle_autocomplete(&self, ctx: &Context, autocomplete: &AutocompleteInteraction) {
        debug!(
            "Autocomplete interaction received for command: {}",
            autocomplete.data.name
        );

        let choices = match get_focused_option(&autocomplete.data.options) {
            Some((option, typed)) => {
                self.command_ctx
                    .persona_choices(&autocomplete.data.name, &option, &typed)
            }
            None => Vec::new(),
        };

        if let Err(e) = autocomplete
            .create_autocomplete_response(&ctx.http, |response| {
                for (label, id) in choices {
                    let label: String = label.chars().take(CHOICE_LABEL_LIMIT).collect();
                    response.add_string_choice(label, id);
                }
                response
            })
            .await
        {
            warn!("Failed to answer autocomplete: {e}");
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        // Own messages and DMs are never answered
        let bot_id = ctx.cache.current_user_id();
        if msg.author.id == bot_id || msg.guild_id.is_none() {
            return;
        }

        let inbound = inbound_from_message(&msg, bot_id);
        let sink = DiscordSink::new(ctx.http.clone());

        let mut assistant = self.assistant.lock().await;
        if let Err(e) = assistant.handle_message(&inbound, &sink).await {
            error!("Error handling message: {e}");
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        if let Some(shard) = ready.shard {
            info!("⚡ Shard: {}/{}", shard[0] + 1, shard[1]);
        }

        ctx.set_activity(Activity::listening("your messages")).await;

        let registered = match self.guild_id {
            Some(guild_id) => register_guild_commands(&ctx.http, guild_id).await,
            None => register_global_commands(&ctx.http).await,
        };
        if let Err(e) = registered {
            error!("Failed to register slash commands: {e}");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::ApplicationCommand(command) => self.handle_command(&ctx, &command).await,
            Interaction::Autocomplete(autocomplete) => {
                self.handle_autocomplete(&ctx, &autocomplete).await
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    // The openai crate reads its key from the environment, not from our config
    if config.model_provider == ModelProvider::OpenAi {
        std::env::set_var("OPENAI_API_KEY", &config.model_api_key);
        std::env::set_var("OPENAI_KEY", &config.model_api_key);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting {}...", config.assistant_name);

    let store = PersonaStore::load(
        Box::new(JsonFileOverlay::new(&config.personas_file)),
        &PromptFile::new(&config.default_prompt_file),
        &config.assistant_name,
    );
    info!("🎭 {} persona(s) loaded: {:?}", store.len(), store.ids());

    // Without a model the bot still runs commands and reports itself unavailable
    let model = match build_model(&config) {
        Ok(model) => Some(model),
        Err(e) => {
            error!("❌ Model client failed to initialize: {e}");
            None
        }
    };

    let assistant =
        Assistant::new(store, AssistantSettings::from_config(&config), model).into_shared();

    // Parse guild ID if provided for development mode
    let guild_id = config
        .discord_guild_id
        .as_ref()
        .and_then(|id| id.parse::<u64>().ok())
        .map(GuildId);

    if let Some(channel) = config.target_channel_id {
        info!("👂 Answering every message in channel {channel}");
    }

    let handler = Handler::new(assistant, guild_id);

    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    {
        let mut data = client.data.write().await;
        data.insert::<ShardManagerContainer>(client.shard_manager.clone());
    }

    info!("Establishing WebSocket connection to Discord gateway...");
    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
