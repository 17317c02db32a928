//! Interactive chat session handler
//!
//! Builds the provider and orchestrator from configuration and runs a
//! readline loop that submits user input one turn at a time. Special
//! commands manage sessions without leaving the loop.

use crate::chat::{ChatOrchestrator, CompletionClient, Message, Sender};
use crate::config::Config;
use crate::credentials;
use crate::error::Result;
use crate::history::SessionStore;
use crate::providers::create_provider;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Start an interactive chat session
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `resume` - Optional session id to resume
/// * `model` - Optional override for the configured model
///
/// # Errors
///
/// Returns an error when no credential can be resolved, the store
/// cannot be opened, or a resumed session does not exist
pub async fn run_chat(
    mut config: Config,
    resume: Option<String>,
    model: Option<String>,
) -> Result<()> {
    tracing::info!("Starting interactive chat session");

    if let Some(model) = model {
        config.provider.openrouter.model = model;
    }

    let api_key = credentials::resolve_api_key(&config.provider.provider_type)?;
    let provider = create_provider(&config.provider.provider_type, &config.provider, api_key)?;
    let client = CompletionClient::new(provider, &config.chat);
    let store = SessionStore::open(&config.storage)?;
    let mut orchestrator = ChatOrchestrator::new(client, store, config.chat.greeting.clone());

    if let Some(id) = resume {
        orchestrator.resume(&id)?;
        println!("{}", format!("Resumed session {}", id).green());
        for message in orchestrator.messages() {
            print_message(message);
        }
    } else {
        print_message(&orchestrator.messages()[0]);
    }

    println!(
        "{}",
        "Type /help for commands, exit to quit.\n".bright_black()
    );

    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline(&"you> ".cyan().to_string()) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                match trimmed {
                    "exit" | "quit" => break,
                    "/help" => {
                        print_help();
                        continue;
                    }
                    "/new" => {
                        orchestrator.clear()?;
                        println!("{}", "Started a new chat.".green());
                        print_message(&orchestrator.messages()[0]);
                        continue;
                    }
                    "/sessions" => {
                        print_sessions(&orchestrator)?;
                        continue;
                    }
                    _ => {}
                }

                println!("{}", "assistant is typing...".bright_black());
                match orchestrator.send_message(trimmed).await {
                    Ok(_) => {
                        if let Some(message) = orchestrator.messages().last() {
                            print_message(message);
                        }
                    }
                    Err(e) => {
                        println!("{}", format!("Error: {:#}", e).red());
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                println!("{}", format!("Input error: {}", e).red());
                break;
            }
        }
    }

    println!("{}", "Goodbye!".green());
    Ok(())
}

fn print_message(message: &Message) {
    match message.sender {
        Sender::User => println!("{} {}", "you:".cyan().bold(), message.content),
        Sender::Assistant => {
            println!("{} {}", "assistant:".magenta().bold(), message.content);
            if let Some(metadata) = &message.metadata {
                let mut parts = Vec::new();
                if let Some(model) = &metadata.model {
                    parts.push(model.clone());
                }
                if let Some(ms) = metadata.processing_time_ms {
                    parts.push(format!("{}ms", ms));
                }
                if let Some(tokens) = metadata.tokens {
                    parts.push(format!("{} tokens", tokens));
                }
                if !parts.is_empty() {
                    println!("{}", format!("  [{}]", parts.join(", ")).bright_black());
                }
            }
        }
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  {}      start a new chat", "/new".cyan());
    println!("  {} list stored sessions", "/sessions".cyan());
    println!("  {}     show this help", "/help".cyan());
    println!("  {}      leave the chat", "exit".cyan());
}

fn print_sessions(orchestrator: &ChatOrchestrator) -> Result<()> {
    let sessions = orchestrator.store().sessions()?;
    if sessions.is_empty() {
        println!("{}", "No stored sessions.".yellow());
        return Ok(());
    }
    for session in sessions {
        println!(
            "  {}  {}  ({} messages)",
            session.id[..8.min(session.id.len())].cyan(),
            session.title,
            session.messages.len()
        );
    }
    println!(
        "Use {} to resume one.",
        "chatling chat --resume <ID>".cyan()
    );
    Ok(())
}
