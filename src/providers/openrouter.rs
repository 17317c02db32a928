//! OpenRouter provider implementation for Chatling
//!
//! This module implements the Provider trait against an
//! OpenRouter-compatible chat-completions endpoint. The provider owns the
//! HTTP client, the retry loop (driven by [`RetryPolicy`]), and the
//! normalization of responses and error statuses. The API credential is
//! injected at construction and never read from configuration files.

use crate::config::OpenRouterConfig;
use crate::error::{ChatlingError, Result};
use crate::providers::{
    AttemptFailure, CompletionResponse, Provider, RetryPolicy, TokenUsage, WireMessage,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed fallback text used when a 2xx response carries no reply
///
/// The call is treated as a success in this case; substituting copy beats
/// failing a conversation over a provider quirk.
pub const APOLOGY_REPLY: &str =
    "I apologize, but I couldn't generate a response. Please try again.";

/// OpenRouter API provider
///
/// Connects to an OpenRouter-compatible endpoint to generate completions.
/// Transient failures (429, 5xx, network) are retried within the policy's
/// attempt budget; all other failures are classified and returned
/// immediately.
///
/// # Examples
///
/// ```no_run
/// use chatling::config::OpenRouterConfig;
/// use chatling::providers::{OpenRouterProvider, Provider, WireMessage};
///
/// # async fn example() -> chatling::error::Result<()> {
/// let config = OpenRouterConfig::default();
/// let provider = OpenRouterProvider::new(config, "sk-test".to_string())?;
/// let messages = vec![WireMessage::user("Hello!")];
/// let completion = provider.complete(&messages, Some(0.7)).await?;
/// println!("{}", completion.text);
/// # Ok(())
/// # }
/// ```
pub struct OpenRouterProvider {
    client: Client,
    config: OpenRouterConfig,
    api_key: String,
    retry: RetryPolicy,
}

/// Request structure for the chat-completions endpoint
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

/// Response structure from the chat-completions endpoint
///
/// Every field defaults so a sparse body still parses; a missing reply is
/// handled by substitution, not by a parse failure.
#[derive(Debug, Deserialize)]
struct CompletionBody {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenRouterProvider {
    /// Create a new OpenRouter provider instance
    ///
    /// # Arguments
    ///
    /// * `config` - Endpoint, model, identification headers, timeout, retry
    /// * `api_key` - Bearer credential, resolved by the caller from the
    ///   keyring or environment
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: OpenRouterConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("chatling/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatlingError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        let retry = RetryPolicy::new(
            config.retry.max_attempts,
            Duration::from_millis(config.retry.backoff_ms),
        );

        tracing::info!(
            "Initialized OpenRouter provider: base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self {
            client,
            config,
            api_key,
            retry,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }

    /// Perform one HTTP attempt, returning the raw status and body
    async fn attempt(
        &self,
        messages: &[WireMessage],
        temperature: Option<f32>,
    ) -> std::result::Result<(u16, String), reqwest::Error> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: temperature.map(|t| t.clamp(0.0, 2.0)),
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.app_title)
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// Parse a successful body, substituting the apology when empty
    fn parse_success(&self, body: &str) -> Result<CompletionResponse> {
        let parsed: CompletionBody = serde_json::from_str(body).map_err(|e| {
            tracing::error!("Failed to parse completion response: {}", e);
            ChatlingError::MalformedResponse(format!("Unparsable completion body: {}", e))
        })?;

        let text = parsed
            .choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone())
            .filter(|content| !content.trim().is_empty())
            .map(|content| content.trim().to_string())
            .unwrap_or_else(|| {
                tracing::warn!("Completion response carried no reply text, substituting apology");
                APOLOGY_REPLY.to_string()
            });

        let model = parsed.model.unwrap_or_else(|| self.config.model.clone());

        Ok(match parsed.usage {
            Some(usage) => CompletionResponse::with_usage(text, model, usage),
            None => CompletionResponse::new(text, model),
        })
    }
}

/// Map a terminal non-2xx status to its error classification
fn classify_status(status: u16, body: &str) -> ChatlingError {
    let detail = if body.is_empty() {
        format!("status {}", status)
    } else {
        body.chars().take(200).collect()
    };
    match status {
        401 => ChatlingError::Unauthorized(detail),
        403 => ChatlingError::Forbidden(detail),
        429 => ChatlingError::RateLimited(detail),
        s if s >= 500 => ChatlingError::ServerError {
            status: s,
            message: detail,
        },
        _ => ChatlingError::Provider(format!("Completion failed with status {}: {}", status, detail)),
    }
}

#[async_trait]
impl Provider for OpenRouterProvider {
    async fn complete(
        &self,
        messages: &[WireMessage],
        temperature: Option<f32>,
    ) -> Result<CompletionResponse> {
        let mut attempt = 1u32;

        loop {
            tracing::debug!(
                "Sending completion request: attempt {}, {} messages",
                attempt,
                messages.len()
            );

            match self.attempt(messages, temperature).await {
                Ok((status, body)) if (200..300).contains(&status) => {
                    return self.parse_success(&body);
                }
                Ok((status, body)) => {
                    if self.retry.should_retry(attempt, AttemptFailure::Status(status)) {
                        tracing::warn!("Completion attempt {} failed with status {}, retrying", attempt, status);
                        self.retry.wait(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    tracing::error!("Completion failed with status {}: {}", status, body);
                    return Err(classify_status(status, &body).into());
                }
                Err(e) => {
                    if self.retry.should_retry(attempt, AttemptFailure::Network) {
                        tracing::warn!("Completion attempt {} hit a network error ({}), retrying", attempt, e);
                        self.retry.wait(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    tracing::error!("Completion request failed: {}", e);
                    return Err(ChatlingError::Network(e.to_string()).into());
                }
            }
        }
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenRouterProvider {
        OpenRouterProvider::new(OpenRouterConfig::default(), "sk-test".to_string()).unwrap()
    }

    #[test]
    fn test_provider_creation() {
        let result = OpenRouterProvider::new(OpenRouterConfig::default(), "sk-test".to_string());
        assert!(result.is_ok());
    }

    #[test]
    fn test_completions_url_strips_trailing_slash() {
        let config = OpenRouterConfig {
            api_base: "http://localhost:9999/api/v1/".to_string(),
            ..Default::default()
        };
        let provider = OpenRouterProvider::new(config, "sk-test".to_string()).unwrap();
        assert_eq!(
            provider.completions_url(),
            "http://localhost:9999/api/v1/chat/completions"
        );
    }

    #[test]
    fn test_parse_success_extracts_reply() {
        let body = r#"{
            "model": "meta-llama/llama-3-8b-instruct",
            "choices": [{"message": {"content": "  Hi there!  "}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let response = provider().parse_success(body).unwrap();
        assert_eq!(response.text, "Hi there!");
        assert_eq!(response.model, "meta-llama/llama-3-8b-instruct");
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_parse_success_missing_choices_substitutes_apology() {
        let response = provider().parse_success("{}").unwrap();
        assert_eq!(response.text, APOLOGY_REPLY);
        assert!(response.usage.is_none());
    }

    #[test]
    fn test_parse_success_blank_content_substitutes_apology() {
        let body = r#"{"choices": [{"message": {"content": "   "}}]}"#;
        let response = provider().parse_success(body).unwrap();
        assert_eq!(response.text, APOLOGY_REPLY);
    }

    #[test]
    fn test_parse_success_rejects_non_json() {
        let err = provider().parse_success("<html>busy</html>").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChatlingError>(),
            Some(ChatlingError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_success_falls_back_to_configured_model() {
        let body = r#"{"choices": [{"message": {"content": "ok"}}]}"#;
        let response = provider().parse_success(body).unwrap();
        assert_eq!(response.model, OpenRouterConfig::default().model);
    }

    #[test]
    fn test_classify_status_unauthorized() {
        assert!(matches!(
            classify_status(401, "bad key"),
            ChatlingError::Unauthorized(_)
        ));
    }

    #[test]
    fn test_classify_status_forbidden() {
        assert!(matches!(
            classify_status(403, ""),
            ChatlingError::Forbidden(_)
        ));
    }

    #[test]
    fn test_classify_status_rate_limited() {
        assert!(matches!(
            classify_status(429, "slow down"),
            ChatlingError::RateLimited(_)
        ));
    }

    #[test]
    fn test_classify_status_server_error_keeps_status() {
        match classify_status(503, "overloaded") {
            ChatlingError::ServerError { status, .. } => assert_eq!(status, 503),
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_classify_status_other_is_generic_provider_error() {
        assert!(matches!(
            classify_status(400, "bad request"),
            ChatlingError::Provider(_)
        ));
    }

    #[test]
    fn test_classify_status_truncates_long_bodies() {
        let long_body = "x".repeat(5000);
        match classify_status(429, &long_body) {
            ChatlingError::RateLimited(detail) => assert_eq!(detail.len(), 200),
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_request_serialization_skips_absent_fields() {
        let messages = vec![WireMessage::user("hi")];
        let request = CompletionRequest {
            model: "test-model",
            messages: &messages,
            temperature: None,
            max_tokens: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("temperature"));
        assert!(!json.contains("max_tokens"));
    }
}
