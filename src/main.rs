use anyhow::Result;
use clap::Parser;

use netchat::{
    app::load_config,
    cli::{handle_command, Cli},
    runtime::{run_oneshot, run_repl},
    utils::init_logger,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Set up logging
    init_logger(cli.verbose);

    // Terminal subcommands (init, list, status, version)
    if let Some(command) = &cli.command {
        if handle_command(command)? {
            return Ok(());
        }
    }

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        let toml_str = std::fs::read_to_string(config_path)?;
        toml::from_str(&toml_str)?
    } else {
        load_config().unwrap_or_default()
    };

    // One-shot or interactive
    if let Some(prompt) = cli.prompt.clone() {
        run_oneshot(&cli, config, prompt).await
    } else {
        run_repl(&cli, config).await
    }
}
