//! Base provider trait and common types for Chatling
//!
//! This module defines the Provider trait that completion providers must
//! implement, along with the wire-level message type, response structures,
//! and token usage metadata.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Wire-level chat message sent to a completion provider
///
/// Roles follow the common chat-completion convention: `system`, `user`,
/// or `assistant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl WireMessage {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use chatling::providers::WireMessage;
    ///
    /// let msg = WireMessage::user("Hello, assistant!");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    ///
    /// # Examples
    ///
    /// ```
    /// use chatling::providers::WireMessage;
    ///
    /// let msg = WireMessage::assistant("Hello, user!");
    /// assert_eq!(msg.role, "assistant");
    /// ```
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new system message
    ///
    /// # Examples
    ///
    /// ```
    /// use chatling::providers::WireMessage;
    ///
    /// let msg = WireMessage::system("You are a helpful assistant.");
    /// assert_eq!(msg.role, "system");
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// Token usage information from a completion
///
/// Tracks the number of tokens used in prompts and completions,
/// as reported by the provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: usize,
    /// Number of tokens in the completion
    #[serde(default)]
    pub completion_tokens: usize,
    /// Total tokens used (prompt + completion)
    #[serde(default)]
    pub total_tokens: usize,
}

impl TokenUsage {
    /// Create a new TokenUsage instance
    ///
    /// # Examples
    ///
    /// ```
    /// use chatling::providers::TokenUsage;
    ///
    /// let usage = TokenUsage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        let total_tokens = prompt_tokens + completion_tokens;
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }
}

/// Completion response with reply text and optional token usage
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// The assistant's reply text
    pub text: String,
    /// Name of the model that produced the reply
    pub model: String,
    /// Optional token usage information
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// Create a new CompletionResponse without usage data
    ///
    /// # Examples
    ///
    /// ```
    /// use chatling::providers::CompletionResponse;
    ///
    /// let response = CompletionResponse::new("Hello!", "test-model");
    /// assert!(response.usage.is_none());
    /// ```
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            usage: None,
        }
    }

    /// Create a new CompletionResponse with token usage
    ///
    /// # Examples
    ///
    /// ```
    /// use chatling::providers::{CompletionResponse, TokenUsage};
    ///
    /// let usage = TokenUsage::new(100, 50);
    /// let response = CompletionResponse::with_usage("Hello!", "test-model", usage);
    /// assert!(response.usage.is_some());
    /// ```
    pub fn with_usage(
        text: impl Into<String>,
        model: impl Into<String>,
        usage: TokenUsage,
    ) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            usage: Some(usage),
        }
    }
}

/// Provider trait for chat-completion backends
///
/// Implementations translate already-sanitized wire messages into a
/// provider-specific request and normalize the response. Retry, input
/// validation, and conversation bookkeeping live above this trait.
///
/// # Examples
///
/// ```no_run
/// use chatling::providers::{Provider, WireMessage, CompletionResponse};
/// use chatling::error::Result;
/// use async_trait::async_trait;
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl Provider for MyProvider {
///     async fn complete(
///         &self,
///         messages: &[WireMessage],
///         temperature: Option<f32>,
///     ) -> Result<CompletionResponse> {
///         let _ = (messages, temperature);
///         Ok(CompletionResponse::new("Response", "my-model"))
///     }
///
///     fn model(&self) -> String {
///         "my-model".to_string()
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Completes a conversation with the given messages
    ///
    /// # Arguments
    ///
    /// * `messages` - Full wire payload including any system message
    /// * `temperature` - Optional sampling temperature, already clamped
    ///
    /// # Errors
    ///
    /// Returns a classified `ChatlingError` if the API call fails after
    /// the provider's retry budget is exhausted.
    async fn complete(
        &self,
        messages: &[WireMessage],
        temperature: Option<f32>,
    ) -> Result<CompletionResponse>;

    /// Name of the currently configured model
    fn model(&self) -> String;
}
