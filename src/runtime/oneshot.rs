use anyhow::Result;
use serde::Serialize;

use super::setup::build_session;
use crate::app::Config;
use crate::cli::{Cli, OutputFormat};
use crate::session::SubmitOutcome;

/// Result of a one-shot run
#[derive(Debug, Serialize)]
pub struct OneshotResult {
    /// The prompt that was executed
    pub prompt: String,
    /// The assistant's reply
    pub response: String,
    /// Model used
    pub model: String,
    /// Execution time in milliseconds
    pub duration_ms: u128,
}

/// Execute a single prompt without entering the chat loop.
///
/// The exchange still lands in the conversation store, so a later
/// interactive session picks it up as the most recent conversation.
pub async fn run_oneshot(cli: &Cli, config: Config, prompt: String) -> Result<()> {
    let (mut session, _credentials) = build_session(cli, &config)?;
    let model = session.model_name().to_string();

    let start = std::time::Instant::now();
    let outcome = session.submit(&prompt).await?;
    let duration_ms = start.elapsed().as_millis();

    let (response, configured) = match outcome {
        SubmitOutcome::Replied(reply) => (reply.content, true),
        SubmitOutcome::NeedsCredential(reply) => (reply.content, false),
        SubmitOutcome::Ignored => (String::new(), true),
    };

    let result = OneshotResult {
        prompt,
        response,
        model,
        duration_ms,
    };

    match cli.output_format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&result)
                .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize result: {}\"}}", e))
        ),
        OutputFormat::Text => println!("{}", result.response),
    }

    if !configured {
        eprintln!("Set an API key first: run `netchat` interactively or export GEMINI_API_KEY");
        std::process::exit(1);
    }

    Ok(())
}
