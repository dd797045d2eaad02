use anyhow::Result;
use colored::Colorize;

use crate::{
    app::{get_config_dir, get_data_dir, init_config},
    constants::API_KEY_ENV_VAR,
    session::{grouped_by_date, ConversationStore, CredentialStore},
};

use super::Commands;

/// Handle CLI subcommands. Returns true when the command was terminal and
/// the chat interface should not start.
pub fn handle_command(command: &Commands) -> Result<bool> {
    match command {
        Commands::Init => {
            println!("Initializing NetChat configuration...");
            init_config()?;
            println!("Configuration initialized successfully!");
            Ok(true)
        }
        Commands::List => {
            list_conversations()?;
            Ok(true)
        }
        Commands::Version => {
            show_version();
            Ok(true)
        }
        Commands::Status => {
            show_status()?;
            Ok(true)
        }
        Commands::Chat => Ok(false), // Continue to chat interface
    }
}

/// List saved conversations grouped by calendar date
pub fn list_conversations() -> Result<()> {
    let store = ConversationStore::new(get_data_dir()?)?;
    let conversations = store.load();

    if conversations.is_empty() {
        println!("No conversations yet");
        return Ok(());
    }

    for (date, members) in grouped_by_date(&conversations) {
        println!("{}", date.bright_black());
        for conversation in members {
            println!(
                "  {}  {} ({} messages)",
                conversation.timestamp.format("%H:%M").to_string().bright_black(),
                conversation.topic.green(),
                conversation.messages.len()
            );
        }
    }
    Ok(())
}

/// Show version information
pub fn show_version() {
    println!("NetChat v{}", env!("CARGO_PKG_VERSION"));
    println!("   A network security assistant you can chat with");
}

/// Show status of configuration and storage
fn show_status() -> Result<()> {
    println!("NetChat Status:");
    println!();

    // Check configuration
    let config_path = get_config_dir()?.join("config.toml");
    if config_path.exists() {
        println!("  [OK] Configuration: {}", config_path.display());
    } else {
        println!("  [WARNING] Configuration: Not found (using defaults)");
    }

    // Check credential sources
    if std::env::var(API_KEY_ENV_VAR).is_ok() {
        println!("  [OK] API key: {} is set", API_KEY_ENV_VAR);
    } else {
        let credentials = CredentialStore::new(get_config_dir()?)?;
        if credentials.load().is_some() {
            println!("  [OK] API key: stored at {}", credentials.path().display());
        } else {
            println!("  [WARNING] API key: Not configured (you will be prompted)");
        }
    }

    // Check conversation storage
    let store = ConversationStore::new(get_data_dir()?)?;
    let count = store.load().len();
    println!(
        "  [OK] Conversations: {} saved at {}",
        count,
        store.path().display()
    );

    println!();
    Ok(())
}
