//! Conversation state and completion flow
//!
//! The chat module holds the in-memory conversation, the client that
//! turns it into provider requests, and the orchestrator that drives a
//! full turn including persistence.

pub mod client;
pub mod conversation;
pub mod message;
pub mod orchestrator;

pub use client::{truncate_chars, CompletionClient, Reply};
pub use conversation::Conversation;
pub use message::{Attachment, Draft, Message, MessageKind, MessageMetadata, Sender};
pub use orchestrator::{
    ChatOrchestrator, TurnOutcome, GENERIC_FAILURE_REPLY, NETWORK_REPLY, RATE_LIMITED_REPLY,
    UNAUTHORIZED_REPLY,
};
