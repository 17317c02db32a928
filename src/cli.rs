//! Command-line interface definition for Chatling
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chatting, serving the HTTP proxy, and
//! managing history and credentials.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chatling - AI chat assistant CLI
///
/// Chat with an AI assistant from the terminal, keep the conversation
/// history locally, and optionally serve the completion proxy over HTTP.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatling")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: String,

    /// Override the history database path
    #[arg(long)]
    pub storage_path: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Chatling
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Resume a stored session by id
        #[arg(short, long)]
        resume: Option<String>,

        /// Override the model from config
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Serve the HTTP completion proxy
    Serve {
        /// Override the listen port from config
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage stored chat history
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Manage provider credentials
    Auth {
        /// Auth subcommand
        #[command(subcommand)]
        command: AuthCommand,
    },
}

/// History management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List stored sessions
    List,

    /// Show the messages of one session
    Show {
        /// Session id
        id: String,
    },

    /// Delete one session
    Delete {
        /// Session id
        id: String,
    },

    /// Delete all sessions
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Export all sessions as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import sessions from a JSON export
    Import {
        /// Path to the JSON file
        input: PathBuf,
    },
}

/// Credential management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommand {
    /// Store an API key in the system keyring
    Set,

    /// Remove the stored API key
    Clear,

    /// Show where the API key would be resolved from
    Status,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
