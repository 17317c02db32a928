//! Chatling - AI chat assistant library
//!
//! This library provides the core functionality for the Chatling chat
//! assistant, including conversation state, completion providers,
//! session persistence, and the HTTP proxy.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `chat`: Conversation state, completion client, and the turn orchestrator
//! - `providers`: Completion provider abstraction and the OpenRouter implementation
//! - `history`: Durable chat sessions over a pluggable key-value store
//! - `server`: HTTP proxy exposing the completion flow to browser clients
//! - `config`: Configuration management and validation
//! - `credentials`: API key resolution (environment, system keyring)
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use chatling::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     // Orchestrator usage would go here
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod history;
pub mod providers;
pub mod server;

// Re-export commonly used types
pub use chat::{ChatOrchestrator, CompletionClient, Conversation, Draft, Message, Sender};
pub use config::Config;
pub use error::{ChatlingError, Result};
pub use history::{ChatSession, SessionStore};
pub use providers::{CompletionResponse, Provider, WireMessage};
