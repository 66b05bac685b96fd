use std::time::Duration;

use adx_agent::error::AgentError;
use adx_agent::models::OpenAiModel;
use adx_agent::provider::openai::OpenAiProvider;
use adx_agent::provider::{ModelProvider, ProviderRequest, ToolDefinition};
use adx_agent::types::{FinishReason, GenerationSettings, ModelMessage};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> OpenAiProvider {
    OpenAiProvider::new(
        OpenAiModel::Gpt4o,
        "sk-test".to_string(),
        Some(format!("{}/v1", server.uri())),
        Duration::from_secs(5),
    )
    .expect("provider should build")
}

fn request(tools: Option<Vec<ToolDefinition>>) -> ProviderRequest {
    ProviderRequest {
        messages: vec![
            ModelMessage::system("You are an incident analyst."),
            ModelMessage::user("How many incidents this week?"),
        ],
        settings: GenerationSettings::deterministic(),
        tools,
    }
}

#[tokio::test]
async fn chat_completion_returns_text_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4o", "temperature": 0.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "role": "assistant", "content": "42 incidents were opened." },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 50, "completion_tokens": 6, "total_tokens": 56 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server)
        .generate_text(&request(None))
        .await
        .expect("completion should succeed");

    assert_eq!(response.text, "42 incidents were opened.");
    assert_eq!(response.finish_reason, Some(FinishReason::Stop));
    assert_eq!(response.usage.total_tokens, 56);
    assert!(response.tool_calls.is_empty());
}

#[tokio::test]
async fn tool_calls_are_parsed_from_function_arguments() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains(r#""name":"kusto""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "kusto",
                            "arguments": "{\"command\":\"kusto_query\",\"parameters\":{\"query\":\"Incidents | take 1\"}}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .mount(&server)
        .await;

    let tools = vec![ToolDefinition {
        name: "kusto".into(),
        description: "Azure Data Explorer".into(),
        parameters: json!({"type": "object", "properties": {}}),
    }];
    let response = provider(&server)
        .generate_text(&request(Some(tools)))
        .await
        .expect("completion should succeed");

    assert_eq!(response.finish_reason, Some(FinishReason::ToolCalls));
    assert_eq!(response.tool_calls.len(), 1);
    let call = &response.tool_calls[0];
    assert_eq!(call.id, "call_1");
    assert_eq!(call.name, "kusto");
    assert_eq!(call.arguments["parameters"]["query"], "Incidents | take 1");
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .generate_text(&request(None))
        .await
        .expect_err("401 should fail");
    assert!(
        matches!(&err, AgentError::Authentication(message) if message == "Incorrect API key provided"),
        "unexpected error: {err:?}"
    );
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn rate_limit_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "Rate limit reached", "retry_after": 1.5 }
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .generate_text(&request(None))
        .await
        .expect_err("429 should fail");
    assert!(matches!(
        err,
        AgentError::RateLimited {
            retry_after_ms: Some(1500)
        }
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn server_error_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .generate_text(&request(None))
        .await
        .expect_err("503 should fail");
    assert!(matches!(err, AgentError::Api { status: 503, .. }));
}
