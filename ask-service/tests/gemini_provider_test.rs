//! Gemini provider tests against a local wiremock server.

use ask_service::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use ask_service::services::providers::{FinishReason, ProviderError, TextProvider};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn provider(api_base: String, api_key: &str) -> GeminiTextProvider {
    GeminiTextProvider::new(GeminiConfig {
        api_key: api_key.to_string(),
        model: "gemini-2.5-flash".to_string(),
        api_base,
        timeout: None,
    })
    .expect("Failed to create provider")
}

#[tokio::test]
async fn sends_prompt_and_returns_answer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "2+2?" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "4" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 4, "candidatesTokenCount": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(format!("{}/v1beta", server.uri()), "test-key");
    let response = provider.generate("2+2?").await.unwrap();

    assert_eq!(response.text.as_deref(), Some("4"));
    assert_eq!(response.input_tokens, 4);
    assert_eq!(response.output_tokens, 1);
    assert_eq!(response.finish_reason, FinishReason::Complete);
}

#[tokio::test]
async fn rate_limit_maps_to_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "Resource exhausted", "status": "RESOURCE_EXHAUSTED" }
        })))
        .mount(&server)
        .await;

    let provider = provider(format!("{}/v1beta", server.uri()), "test-key");
    let err = provider.generate("x").await.unwrap_err();

    assert_eq!(err, ProviderError::RateLimited);
}

#[tokio::test]
async fn api_error_carries_status_and_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let provider = provider(format!("{}/v1beta", server.uri()), "bad-key");
    let err = provider.generate("x").await.unwrap_err();

    assert_eq!(
        err,
        ProviderError::ApiError("Gemini API error 400 Bad Request: API key not valid.".to_string())
    );
}

#[tokio::test]
async fn malformed_body_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let provider = provider(format!("{}/v1beta", server.uri()), "test-key");
    let err = provider.generate("x").await.unwrap_err();

    assert!(matches!(err, ProviderError::InvalidResponse(_)));
}

#[tokio::test]
async fn missing_key_fails_without_calling_api() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = provider(format!("{}/v1beta", server.uri()), "");
    let err = provider.generate("x").await.unwrap_err();

    assert!(matches!(err, ProviderError::NotConfigured(_)));
}

#[tokio::test]
async fn unreachable_api_is_network_error_without_key_leak() {
    let provider = provider("http://127.0.0.1:1/v1beta".to_string(), "secret-key");
    let err = provider.generate("x").await.unwrap_err();

    let message = match &err {
        ProviderError::NetworkError(message) => message.clone(),
        other => panic!("expected network error, got {:?}", other),
    };
    // The cause chain is kept, not just "error sending request".
    assert!(message.starts_with("error sending request: "), "{}", message);
    assert!(message.len() > "error sending request: ".len());
    assert!(!message.contains("secret-key"));
}
