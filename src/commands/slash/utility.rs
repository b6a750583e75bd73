//! Utility slash commands: /help, /ping

use serenity::builder::CreateApplicationCommand;

pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        CreateApplicationCommand::default()
            .name("help")
            .description("Show the available commands")
            .to_owned(),
        CreateApplicationCommand::default()
            .name("ping")
            .description("Check the bot's latency")
            .to_owned(),
    ]
}
