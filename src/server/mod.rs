//! HTTP proxy in front of the completion provider
//!
//! Exposes the chat completion flow over a small axum router so
//! browser clients can talk to the provider without ever holding the
//! API key. Requests are sanitized with the same rules the local chat
//! uses before they are forwarded.

use crate::chat::truncate_chars;
use crate::config::Config;
use crate::error::{classify, ChatlingError, Result};
use crate::providers::{Provider, TokenUsage, WireMessage};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// State shared across proxy routes
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn Provider>,
    pub system_prompt: String,
    pub default_temperature: f32,
    pub max_content_length: usize,
}

/// Incoming chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<IncomingMessage>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// One message as submitted by a proxy client
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// Successful proxy response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// Error body returned by the proxy
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error: error.into(),
            details,
        }
    }
}

/// Build the proxy router with permissive CORS
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

/// Start the proxy server described by the configuration
///
/// # Errors
///
/// Returns an error if no credential can be resolved or the listener
/// cannot bind
pub async fn run(config: &Config) -> Result<()> {
    let api_key = crate::credentials::resolve_api_key(&config.provider.provider_type)?;
    let provider = crate::providers::create_provider(
        &config.provider.provider_type,
        &config.provider,
        api_key,
    )?;

    let state = AppState {
        provider,
        system_prompt: config.chat.system_prompt.clone(),
        default_temperature: config.chat.temperature,
        max_content_length: config.chat.max_content_length,
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Proxy listening on http://{}", addr);
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

/// GET /api/health
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Sanitize client messages into the wire shape
///
/// Trims and caps every entry, drops empties and unknown roles, and
/// prepends the configured system prompt when the client did not send
/// one first.
fn sanitize_messages(state: &AppState, incoming: &[IncomingMessage]) -> Vec<WireMessage> {
    let mut wire: Vec<WireMessage> = Vec::with_capacity(incoming.len() + 1);
    for message in incoming {
        let content = truncate_chars(message.content.trim(), state.max_content_length);
        if content.is_empty() {
            continue;
        }
        match message.role.as_str() {
            "user" => wire.push(WireMessage::user(content)),
            "assistant" => wire.push(WireMessage::assistant(content)),
            "system" => wire.push(WireMessage::system(content)),
            other => warn!("Dropping message with unknown role {:?}", other),
        }
    }

    if wire.first().map(|m| m.role != "system").unwrap_or(false) {
        wire.insert(0, WireMessage::system(state.system_prompt.clone()));
    }
    wire
}

/// POST /api/chat
async fn chat_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::new(
                    "Invalid request body",
                    Some(rejection.body_text()),
                )),
            )
                .into_response();
        }
    };

    let wire = sanitize_messages(&state, &request.messages);
    if !wire.iter().any(|m| m.role != "system") {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("Messages are required", None)),
        )
            .into_response();
    }

    let temperature = request
        .temperature
        .unwrap_or(state.default_temperature)
        .clamp(0.0, 2.0);

    match state.provider.complete(&wire, Some(temperature)).await {
        Ok(response) => (
            StatusCode::OK,
            Json(ChatResponse {
                reply: response.text,
                model: response.model,
                usage: response.usage,
            }),
        )
            .into_response(),
        Err(e) => {
            warn!("Upstream completion failed: {:#}", e);
            let (status, label) = match classify(&e) {
                Some(ChatlingError::Unauthorized(_)) => {
                    (StatusCode::UNAUTHORIZED, "Invalid API key")
                }
                Some(ChatlingError::Forbidden(_)) => (StatusCode::FORBIDDEN, "Access denied"),
                Some(ChatlingError::RateLimited(_)) => {
                    (StatusCode::TOO_MANY_REQUESTS, "Rate limited")
                }
                Some(ChatlingError::ServerError { .. })
                | Some(ChatlingError::Network(_))
                | Some(ChatlingError::Http(_)) => {
                    (StatusCode::BAD_GATEWAY, "Upstream provider unavailable")
                }
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to get response from AI",
                ),
            };
            (
                status,
                Json(ErrorBody::new(label, Some(format!("{:#}", e)))),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::CompletionResponse;
    use async_trait::async_trait;

    struct NullProvider;

    #[async_trait]
    impl Provider for NullProvider {
        async fn complete(
            &self,
            _messages: &[WireMessage],
            _temperature: Option<f32>,
        ) -> Result<CompletionResponse> {
            Ok(CompletionResponse::new(String::new(), "m".to_string()))
        }

        fn model(&self) -> String {
            "m".to_string()
        }
    }

    fn test_state() -> AppState {
        AppState {
            provider: Arc::new(NullProvider),
            system_prompt: "You are a helpful assistant.".to_string(),
            default_temperature: 0.7,
            max_content_length: 10_000,
        }
    }

    fn incoming(role: &str, content: &str) -> IncomingMessage {
        IncomingMessage {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_sanitize_prepends_system_prompt() {
        let wire = sanitize_messages(&test_state(), &[incoming("user", "hi")]);
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0].role, "system");
        assert_eq!(wire[0].content, "You are a helpful assistant.");
        assert_eq!(wire[1].role, "user");
    }

    #[test]
    fn test_sanitize_keeps_client_system_prompt() {
        let wire = sanitize_messages(
            &test_state(),
            &[incoming("system", "custom"), incoming("user", "hi")],
        );
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0].content, "custom");
    }

    #[test]
    fn test_sanitize_drops_empty_and_unknown_roles() {
        let wire = sanitize_messages(
            &test_state(),
            &[
                incoming("user", "   "),
                incoming("tool", "sneaky"),
                incoming("user", "kept"),
            ],
        );
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[1].content, "kept");
    }

    #[test]
    fn test_sanitize_caps_long_content() {
        let long = "x".repeat(20_000);
        let wire = sanitize_messages(&test_state(), &[incoming("user", &long)]);
        assert_eq!(wire[1].content.chars().count(), 10_000);
    }

    #[test]
    fn test_sanitize_empty_input_yields_nothing() {
        let wire = sanitize_messages(&test_state(), &[]);
        assert!(wire.is_empty());
    }
}
