//! History management command handlers

use crate::chat::Sender;
use crate::cli::HistoryCommand;
use crate::config::Config;
use crate::error::{ChatlingError, Result};
use crate::history::SessionStore;
use colored::Colorize;
use prettytable::{format, Table};
use std::io::Write;

/// Handle history commands
pub fn handle_history(command: HistoryCommand, config: &Config) -> Result<()> {
    let store = SessionStore::open(&config.storage)?;

    match command {
        HistoryCommand::List => {
            let sessions = store.sessions()?;

            if sessions.is_empty() {
                println!("{}", "No chat history found.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "ID".bold(),
                "Title".bold(),
                "Messages".bold(),
                "Last Updated".bold()
            ]);

            for session in sessions {
                let id_short = &session.id[..8.min(session.id.len())];
                let title = if session.title.chars().count() > 40 {
                    let head: String = session.title.chars().take(37).collect();
                    format!("{}...", head)
                } else {
                    session.title
                };
                let updated = session.updated_at.format("%Y-%m-%d %H:%M").to_string();

                table.add_row(prettytable::row![
                    id_short.cyan(),
                    title,
                    session.messages.len(),
                    updated
                ]);
            }

            println!("\nChat History:");
            table.printstd();
            println!();
            println!(
                "Use {} to resume a session.",
                "chatling chat --resume <ID>".cyan()
            );
            println!();
        }
        HistoryCommand::Show { id } => {
            let session = store
                .load_session(&id)?
                .ok_or_else(|| ChatlingError::Storage(format!("No such session: {}", id)))?;

            println!("\n{} ({})", session.title.bold(), session.id.cyan());
            println!(
                "{}",
                format!(
                    "Created {}, updated {}",
                    session.created_at.format("%Y-%m-%d %H:%M"),
                    session.updated_at.format("%Y-%m-%d %H:%M")
                )
                .bright_black()
            );
            println!();
            for message in &session.messages {
                let label = match message.sender {
                    Sender::User => "you:".cyan().bold(),
                    Sender::Assistant => "assistant:".magenta().bold(),
                };
                println!("{} {}", label, message.content);
            }
            println!();
        }
        HistoryCommand::Delete { id } => {
            store.delete_session(&id)?;
            println!("{}", format!("Deleted session {}", id).green());
        }
        HistoryCommand::Clear { yes } => {
            if !yes {
                print!("Delete ALL chat history? [y/N] ");
                std::io::stdout().flush()?;
                let mut answer = String::new();
                std::io::stdin().read_line(&mut answer)?;
                if !matches!(answer.trim(), "y" | "Y" | "yes") {
                    println!("Aborted.");
                    return Ok(());
                }
            }
            store.clear_all()?;
            println!("{}", "Cleared all chat history.".green());
        }
        HistoryCommand::Export { output } => {
            let json = store.export_all()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!(
                        "{}",
                        format!("Exported history to {}", path.display()).green()
                    );
                }
                None => println!("{}", json),
            }
        }
        HistoryCommand::Import { input } => {
            let raw = std::fs::read_to_string(&input)?;
            let imported = store.import_all(&raw)?;
            println!(
                "{}",
                format!("Imported {} session(s) from {}", imported, input.display()).green()
            );
        }
    }

    Ok(())
}
