use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

use super::setup::build_session;
use crate::app::Config;
use crate::cli::Cli;
use crate::constants::SUGGESTED_PROMPTS;
use crate::models::{ChatMessage, MessageRole};
use crate::session::{grouped_by_date, select_conversation, ChatSession, CredentialStore, SubmitOutcome};

/// Run the interactive chat loop
pub async fn run_repl(cli: &Cli, config: Config) -> Result<()> {
    let (mut session, credentials) = build_session(cli, &config)?;

    if cli.new {
        session.start_new()?;
    } else if cli.resume {
        let mut choices = session.conversations().to_vec();
        choices.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(chosen) = select_conversation(choices)? {
            session.select(&chosen.id);
        }
    }

    println!(
        "{}",
        "NetChat - Network Security Assistant".bright_cyan().bold()
    );
    println!(
        "{}",
        format!("Model: {}", session.model_name()).bright_black()
    );
    println!(
        "{}",
        "Type /help for commands, /quit to exit\n".bright_black()
    );

    let mut editor = DefaultEditor::new()?;

    // Credential acquisition blocks the first outbound request, not startup
    if !session.is_configured() {
        prompt_for_api_key(&mut editor, &mut session, &credentials)?;
    }

    if session.transcript().is_empty() {
        print_greeting();
    } else {
        for message in session.transcript().to_vec() {
            print_message(&message);
        }
    }

    loop {
        let readline = editor.readline(&format!("{} ", "You:".bright_green().bold()));
        match readline {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(&line)?;

                if line == "exit" || line == "quit" {
                    break;
                }
                if let Some(command) = line.strip_prefix('/') {
                    if handle_slash_command(command, &mut editor, &mut session, &credentials)? {
                        break;
                    }
                    continue;
                }

                println!("{}", "Assistant is typing...".bright_black());
                match session.submit(&line).await {
                    Ok(SubmitOutcome::Replied(reply)) => print_message(&reply),
                    Ok(SubmitOutcome::NeedsCredential(reply)) => {
                        print_message(&reply);
                        prompt_for_api_key(&mut editor, &mut session, &credentials)?;
                    }
                    Ok(SubmitOutcome::Ignored) => {}
                    Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "(Use /quit to exit)".bright_black());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    println!("{}", "Goodbye!".bright_cyan());
    Ok(())
}

/// Handle a /command line. Returns true when the loop should exit.
fn handle_slash_command(
    command: &str,
    editor: &mut DefaultEditor,
    session: &mut ChatSession,
    credentials: &CredentialStore,
) -> Result<bool> {
    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or("") {
        "quit" | "exit" | "q" => return Ok(true),
        "new" => {
            session.start_new()?;
            println!("{}", "Started a new conversation".bright_black());
            print_greeting();
        }
        "list" => print_conversation_list(session),
        "open" => match parts.next().and_then(|n| n.parse::<usize>().ok()) {
            Some(index) if index >= 1 => {
                let ids = newest_first_ids(session);
                match ids.get(index - 1) {
                    Some(id) => {
                        session.select(id);
                        println!();
                        for message in session.transcript().to_vec() {
                            print_message(&message);
                        }
                    }
                    None => println!("{}", "No such conversation".red()),
                }
            }
            _ => println!("{}", "Usage: /open <number> (see /list)".bright_black()),
        },
        "key" => prompt_for_api_key(editor, session, credentials)?,
        "help" => print_help(),
        other => println!(
            "{}",
            format!("Unknown command '/{}', try /help", other).red()
        ),
    }
    Ok(false)
}

/// Ask for an API key, store it for future sessions and install it on the
/// backend. Ctrl-C leaves the session unconfigured.
fn prompt_for_api_key(
    editor: &mut DefaultEditor,
    session: &mut ChatSession,
    credentials: &CredentialStore,
) -> Result<()> {
    println!(
        "{}",
        "An API key from Google AI Studio is required to chat. It is stored locally on this device."
            .yellow()
    );
    loop {
        match editor.readline("API key: ") {
            Ok(line) => {
                let key = line.trim().to_string();
                if key.is_empty() {
                    continue;
                }
                if let Err(e) = credentials.save(&key) {
                    warn!("Could not store API key: {:#}", e);
                }
                session.install_api_key(key);
                println!("{}", "API key saved".green());
                return Ok(());
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!(
                    "{}",
                    "Skipped. You will be asked again before the next request.".bright_black()
                );
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn newest_first_ids(session: &ChatSession) -> Vec<String> {
    let mut conversations = session.conversations().to_vec();
    conversations.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    conversations.into_iter().map(|c| c.id).collect()
}

fn print_conversation_list(session: &ChatSession) {
    if session.conversations().is_empty() {
        println!("{}", "No conversations yet".bright_black());
        return;
    }

    let mut index = 0;
    for (date, members) in grouped_by_date(session.conversations()) {
        println!("{}", date.bright_black());
        for conversation in members {
            index += 1;
            let marker = if Some(conversation.id.as_str()) == session.active_id() {
                "*"
            } else {
                " "
            };
            println!(
                " {}{:>3}. {}  {}",
                marker,
                index,
                conversation.timestamp.format("%H:%M").to_string().bright_black(),
                conversation.topic.green()
            );
        }
    }
}

fn print_message(message: &ChatMessage) {
    let time = message
        .timestamp
        .format("%H:%M")
        .to_string()
        .bright_black();
    match message.role {
        MessageRole::User => {
            println!("{} {}  {}", "You:".bright_green().bold(), message.content, time)
        }
        MessageRole::Assistant => {
            println!(
                "{} {}  {}\n",
                "Assistant:".bright_cyan().bold(),
                message.content,
                time
            )
        }
    }
}

fn print_greeting() {
    println!(
        "Ask me anything about networking, cybersecurity, protocols, or network architecture."
    );
    println!("{}", "For example:".bright_black());
    for suggestion in SUGGESTED_PROMPTS {
        println!("  {} {}", "-".bright_black(), suggestion);
    }
    println!();
}

fn print_help() {
    println!("Commands:");
    println!("  /new          Start a new conversation");
    println!("  /list         List saved conversations");
    println!("  /open <n>     Switch to conversation <n> from /list");
    println!("  /key          Set the API key");
    println!("  /help         Show this help");
    println!("  /quit         Exit");
}
