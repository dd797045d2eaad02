use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "netchat")]
#[command(version = "0.1.0")]
#[command(about = "A network security assistant you can chat with", long_about = None)]
pub struct Cli {
    /// Model to use (e.g., gemini-1.5-pro)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Pick a previous conversation to resume (shows selection UI)
    #[arg(long, conflicts_with = "new")]
    pub resume: bool,

    /// Start with a fresh conversation instead of the most recent one
    #[arg(long, conflicts_with = "resume")]
    pub new: bool,

    /// Non-interactive prompt to execute
    #[arg(short, long, conflicts_with_all = &["resume", "new"])]
    pub prompt: Option<String>,

    /// Output format for non-interactive mode
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, requires = "prompt")]
    pub output_format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration
    Init,
    /// List saved conversations
    List,
    /// Start a chat session (default)
    Chat,
    /// Show version information
    Version,
    /// Check status of configuration and storage
    Status,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON structured output
    Json,
}
