//! Persona slash commands: /personas, /persona_set, /persona_create,
//! /persona_edit, /persona_delete, /forget, /context

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

/// Creates persona commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        create_personas_command(),
        create_persona_set_command(),
        create_persona_create_command(),
        create_persona_edit_command(),
        create_persona_delete_command(),
        create_forget_command(),
        create_context_command(),
    ]
}

fn create_personas_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("personas")
        .description("List the available personas and show the active one")
        .to_owned()
}

fn create_persona_set_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("persona_set")
        .description("Change the active persona (clears the conversation memory)")
        .create_option(|option| {
            option
                .name("persona_id")
                .description("ID of the persona to activate")
                .kind(CommandOptionType::String)
                .required(true)
                .set_autocomplete(true)
        })
        .to_owned()
}

fn create_persona_create_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("persona_create")
        .description("Create a new persona")
        .create_option(|option| {
            option
                .name("persona_id")
                .description("Unique ID (letters, digits, underscores)")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("name")
                .description("Display name")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("description")
                .description("Short description")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("prompt")
                .description("System prompt (defaults to the default persona's prompt)")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .to_owned()
}

fn create_persona_edit_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("persona_edit")
        .description("Change a persona's name, description or prompt")
        .create_option(|option| {
            option
                .name("persona_id")
                .description("ID of the persona to edit")
                .kind(CommandOptionType::String)
                .required(true)
                .set_autocomplete(true)
        })
        .create_option(|option| {
            option
                .name("name")
                .description("New display name")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .create_option(|option| {
            option
                .name("description")
                .description("New description")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .create_option(|option| {
            option
                .name("prompt")
                .description("New system prompt")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .to_owned()
}

fn create_persona_delete_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("persona_delete")
        .description("Delete a persona (except 'default')")
        .create_option(|option| {
            option
                .name("persona_id")
                .description("ID of the persona to delete")
                .kind(CommandOptionType::String)
                .required(true)
                .set_autocomplete(true)
        })
        .to_owned()
}

fn create_forget_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("forget")
        .description("Clear the conversation memory, keep the persona")
        .to_owned()
}

fn create_context_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("context")
        .description("Show the active persona and how much is remembered")
        .to_owned()
}
