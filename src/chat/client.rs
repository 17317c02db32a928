//! Completion client: conversation to provider translation
//!
//! Sits between the orchestrator and the [`Provider`] trait. Validates
//! and bounds the user's input, builds the wire payload (system prompt,
//! filtered history, new user turn), and measures wall-clock processing
//! time. Everything network-shaped lives below this layer; everything
//! conversation-shaped lives above it.

use crate::chat::message::{Message, Sender};
use crate::config::ChatConfig;
use crate::error::{ChatlingError, Result};
use crate::providers::{Provider, TokenUsage, WireMessage};
use std::sync::Arc;
use std::time::Instant;

/// Normalized outcome of a completion call
#[derive(Debug, Clone)]
pub struct Reply {
    /// Assistant reply text
    pub text: String,
    /// Model that produced the reply
    pub model: String,
    /// Token usage, when the provider reports it
    pub usage: Option<TokenUsage>,
    /// Wall-clock time spent on the call, in milliseconds
    pub processing_time_ms: u64,
}

/// Truncate a string to a maximum number of characters, boundary safe
///
/// # Examples
///
/// ```
/// use chatling::chat::truncate_chars;
///
/// assert_eq!(truncate_chars("hello", 3), "hel");
/// assert_eq!(truncate_chars("hi", 10), "hi");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Translates conversation history into provider requests
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use chatling::chat::CompletionClient;
/// use chatling::config::{ChatConfig, OpenRouterConfig};
/// use chatling::providers::OpenRouterProvider;
///
/// # async fn example() -> chatling::error::Result<()> {
/// let provider = OpenRouterProvider::new(OpenRouterConfig::default(), "sk-test".into())?;
/// let client = CompletionClient::new(Arc::new(provider), &ChatConfig::default());
/// let reply = client.complete(&[], "Hello!").await?;
/// println!("{}", reply.text);
/// # Ok(())
/// # }
/// ```
pub struct CompletionClient {
    provider: Arc<dyn Provider>,
    system_prompt: String,
    temperature: f32,
    max_content_length: usize,
}

impl CompletionClient {
    /// Create a client over a provider with the given chat settings
    pub fn new(provider: Arc<dyn Provider>, chat: &ChatConfig) -> Self {
        Self {
            provider,
            system_prompt: chat.system_prompt.clone(),
            temperature: chat.temperature,
            max_content_length: chat.max_content_length,
        }
    }

    /// Validate and bound a new user turn
    ///
    /// Trims surrounding whitespace and silently truncates past the
    /// content cap.
    ///
    /// # Errors
    ///
    /// Returns `ChatlingError::InvalidInput` when nothing remains after
    /// trimming.
    pub fn validate_input(&self, new_user_text: &str) -> Result<String> {
        let trimmed = new_user_text.trim();
        if trimmed.is_empty() {
            return Err(
                ChatlingError::InvalidInput("message must not be empty".to_string()).into(),
            );
        }
        Ok(truncate_chars(trimmed, self.max_content_length))
    }

    /// Build the wire payload: system prompt, history, new user turn
    ///
    /// Only user and assistant messages from the history make it onto
    /// the wire; entries whose content is empty after trimming (for
    /// example pure-image messages) are dropped.
    fn build_payload(&self, history: &[Message], new_user_text: &str) -> Vec<WireMessage> {
        let mut payload = Vec::with_capacity(history.len() + 2);
        payload.push(WireMessage::system(self.system_prompt.clone()));

        for message in history {
            let content = truncate_chars(message.content.trim(), self.max_content_length);
            if content.is_empty() {
                continue;
            }
            payload.push(match message.sender {
                Sender::User => WireMessage::user(content),
                Sender::Assistant => WireMessage::assistant(content),
            });
        }

        payload.push(WireMessage::user(new_user_text.to_string()));
        payload
    }

    /// Send the conversation plus a new user turn to the provider
    ///
    /// # Arguments
    ///
    /// * `history` - Messages exchanged so far, oldest first
    /// * `new_user_text` - The turn being submitted
    ///
    /// # Errors
    ///
    /// `InvalidInput` before any network call when the turn is empty;
    /// otherwise whatever classified error the provider surfaces after
    /// its retry budget.
    pub async fn complete(&self, history: &[Message], new_user_text: &str) -> Result<Reply> {
        let text = self.validate_input(new_user_text)?;
        let payload = self.build_payload(history, &text);

        let started = Instant::now();
        let response = self
            .provider
            .complete(&payload, Some(self.temperature))
            .await?;
        let processing_time_ms = started.elapsed().as_millis() as u64;

        tracing::debug!(
            "Completion finished in {}ms, model={}",
            processing_time_ms,
            response.model
        );

        Ok(Reply {
            text: response.text,
            model: response.model,
            usage: response.usage,
            processing_time_ms,
        })
    }
}
