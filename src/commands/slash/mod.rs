//! # Slash Commands (/)
//!
//! Discord native slash command definitions, registration and autocomplete.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

mod persona;
mod utility;

use anyhow::Result;
use log::info;
use serenity::builder::CreateApplicationCommand;
use serenity::http::Http;
use serenity::model::application::command::Command;
use serenity::model::application::interaction::application_command::CommandDataOption;
use serenity::model::id::GuildId;

/// Commands whose `persona_id` option autocompletes from the registry
pub const PERSONA_AUTOCOMPLETE_COMMANDS: &[&str] = &["persona_set", "persona_edit", "persona_delete"];

/// Creates all slash command definitions
pub fn create_slash_commands() -> Vec<CreateApplicationCommand> {
    let mut commands = Vec::new();

    // Utility commands
    commands.extend(utility::create_commands());

    // Persona commands
    commands.extend(persona::create_commands());

    commands
}

/// Registers all slash commands globally (can take up to an hour to show up)
pub async fn register_global_commands(http: &Http) -> Result<()> {
    let slash_commands = create_slash_commands();
    let count = slash_commands.len();

    Command::set_global_application_commands(http, |commands| {
        for command in slash_commands {
            commands.add_application_command(command);
        }
        commands
    })
    .await?;

    info!("Global slash commands registered successfully ({count} commands)");
    Ok(())
}

/// Registers all slash commands for a specific guild (faster for testing)
pub async fn register_guild_commands(http: &Http, guild_id: GuildId) -> Result<()> {
    let slash_commands = create_slash_commands();
    let count = slash_commands.len();

    guild_id
        .set_application_commands(http, |commands| {
            for command in slash_commands {
                commands.add_application_command(command);
            }
            commands
        })
        .await?;

    info!("Guild slash commands registered for guild {guild_id} ({count} commands)");
    Ok(())
}

/// The option currently being typed in an autocomplete interaction
pub fn get_focused_option(options: &[CommandDataOption]) -> Option<(String, String)> {
    options.iter().find(|opt| opt.focused).map(|opt| {
        let typed = opt
            .value
            .as_ref()
            .and_then(|val| val.as_str())
            .unwrap_or_default()
            .to_string();
        (opt.name.clone(), typed)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        create_slash_commands()
            .iter()
            .map(|cmd| cmd.0.get("name").unwrap().as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_create_slash_commands() {
        let command_names = names();

        let expected_commands = vec![
            "help",
            "ping",
            "personas",
            "persona_set",
            "persona_create",
            "persona_edit",
            "persona_delete",
            "forget",
            "context",
        ];

        for expected in &expected_commands {
            assert!(
                command_names.contains(&expected.to_string()),
                "Missing command: {expected}"
            );
        }
        assert_eq!(command_names.len(), expected_commands.len());
    }

    #[test]
    fn test_autocomplete_commands_exist() {
        let command_names = names();
        for name in PERSONA_AUTOCOMPLETE_COMMANDS {
            assert!(command_names.contains(&name.to_string()));
        }
    }

    #[test]
    fn test_create_requires_id_name_description() {
        let commands = create_slash_commands();
        let create = commands
            .iter()
            .find(|cmd| cmd.0.get("name").and_then(|v| v.as_str()) == Some("persona_create"))
            .unwrap();
        let options = create.0.get("options").unwrap().as_array().unwrap();

        let required: Vec<&str> = options
            .iter()
            .filter(|opt| opt["required"].as_bool() == Some(true))
            .map(|opt| opt["name"].as_str().unwrap())
            .collect();
        assert_eq!(required, vec!["persona_id", "name", "description"]);
    }
}
