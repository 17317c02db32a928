//! Full chat turns through the orchestrator against a mock endpoint

use serde_json::json;

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatling::chat::{
    ChatOrchestrator, CompletionClient, Sender, TurnOutcome, RATE_LIMITED_REPLY,
};
use chatling::config::{ChatConfig, OpenRouterConfig, RetryConfig};
use chatling::history::{MemoryStore, SessionStore};
use chatling::providers::OpenRouterProvider;
use std::sync::Arc;

const GREETING: &str = "Hello! I'm your AI assistant. How can I help you today?";

fn orchestrator_against(server: &MockServer) -> ChatOrchestrator {
    let provider_config = OpenRouterConfig {
        api_base: server.uri(),
        retry: RetryConfig {
            max_attempts: 2,
            backoff_ms: 1,
        },
        ..Default::default()
    };
    let provider = OpenRouterProvider::new(provider_config, "sk-test".to_string()).unwrap();
    let client = CompletionClient::new(Arc::new(provider), &ChatConfig::default());
    let store = SessionStore::new(Box::new(MemoryStore::new()));
    ChatOrchestrator::new(client, store, GREETING)
}

#[tokio::test]
async fn test_hello_turn_produces_three_messages_and_a_saved_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Hi! What can I do for you?"}}],
            "model": "meta-llama/llama-3-8b-instruct",
            "usage": {"prompt_tokens": 20, "completion_tokens": 8, "total_tokens": 28}
        })))
        .mount(&server)
        .await;

    let mut orchestrator = orchestrator_against(&server);
    let outcome = orchestrator.send_message("Hello").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Replied);

    let messages = orchestrator.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].content, GREETING);
    assert_eq!(messages[1].sender, Sender::User);
    assert_eq!(messages[2].sender, Sender::Assistant);
    assert_eq!(messages[2].metadata.as_ref().unwrap().tokens, Some(28));

    let sessions = orchestrator.store().sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].title, "Hello");
    assert_eq!(sessions[0].messages.len(), 3);
}

#[tokio::test]
async fn test_wire_payload_prepends_system_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system", "content": "You are a helpful assistant."},
                {"role": "assistant", "content": GREETING},
                {"role": "user", "content": "Hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "hi"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut orchestrator = orchestrator_against(&server);
    orchestrator.send_message("Hello").await.unwrap();
}

#[tokio::test]
async fn test_rate_limited_turn_synthesizes_assistant_copy() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    let mut orchestrator = orchestrator_against(&server);
    let outcome = orchestrator.send_message("Hello").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Failed);

    let messages = orchestrator.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].content, RATE_LIMITED_REPLY);

    // The failed turn is still persisted with the user's text intact.
    let sessions = orchestrator.store().sessions().unwrap();
    assert_eq!(sessions[0].messages[1].content, "Hello");
}

#[tokio::test]
async fn test_multi_turn_history_flows_back_to_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "answer"}}]
        })))
        .mount(&server)
        .await;

    let mut orchestrator = orchestrator_against(&server);
    orchestrator.send_message("first").await.unwrap();

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system", "content": "You are a helpful assistant."},
                {"role": "assistant", "content": GREETING},
                {"role": "user", "content": "first"},
                {"role": "assistant", "content": "answer"},
                {"role": "user", "content": "second"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "another answer"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    orchestrator.send_message("second").await.unwrap();
    assert_eq!(orchestrator.messages().len(), 5);
}

#[tokio::test]
async fn test_clear_then_resume_brings_the_session_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "noted"}}]
        })))
        .mount(&server)
        .await;

    let mut orchestrator = orchestrator_against(&server);
    orchestrator.send_message("remember me").await.unwrap();
    let id = orchestrator.store().current_id().unwrap().unwrap();

    orchestrator.clear().unwrap();
    assert_eq!(orchestrator.messages().len(), 1);

    orchestrator.resume(&id).unwrap();
    assert_eq!(orchestrator.messages().len(), 3);
    assert_eq!(orchestrator.messages()[1].content, "remember me");
}
