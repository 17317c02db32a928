//! Credential management command handlers

use crate::cli::AuthCommand;
use crate::config::Config;
use crate::credentials::{self, CredentialSource};
use crate::error::Result;
use colored::Colorize;
use rustyline::DefaultEditor;

/// Handle auth commands
///
/// The key is read interactively and only ever written to the system
/// keyring.
pub fn handle_auth(command: AuthCommand, config: &Config) -> Result<()> {
    let provider = config.provider.provider_type.as_str();

    match command {
        AuthCommand::Set => {
            let mut rl = DefaultEditor::new()?;
            let key = rl.readline(&format!("API key for {}: ", provider))?;
            credentials::store_api_key(provider, &key)?;
            println!(
                "{}",
                format!("Stored API key for {} in system keyring.", provider).green()
            );
        }
        AuthCommand::Clear => {
            credentials::clear_api_key(provider);
            println!("{}", format!("Cleared API key for {}.", provider).green());
        }
        AuthCommand::Status => match credentials::credential_status(provider) {
            Some(CredentialSource::Environment) => {
                println!(
                    "{}",
                    format!(
                        "API key for {} resolved from {}.",
                        provider,
                        credentials::API_KEY_ENV
                    )
                    .green()
                );
            }
            Some(CredentialSource::Keyring) => {
                println!(
                    "{}",
                    format!("API key for {} resolved from system keyring.", provider).green()
                );
            }
            None => {
                println!(
                    "{}",
                    format!(
                        "No API key found for {}. Set {} or run `chatling auth set`.",
                        provider,
                        credentials::API_KEY_ENV
                    )
                    .yellow()
                );
            }
        },
    }

    Ok(())
}
