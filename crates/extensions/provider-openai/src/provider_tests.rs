use super::*;
use std::time::Duration;
use unibridge_protocols::error::ErrorKind;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-123",
        "model": "gpt-4o-2024-08-06",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
    })
}

fn provider_for(server: &MockServer) -> OpenAIProvider {
    OpenAIProvider::with_base_url("test-key".to_string(), &format!("{}/v1", server.uri()))
}

#[test]
fn test_provider_defaults() {
    let provider = OpenAIProvider::new("key".to_string());
    assert_eq!(provider.id(), "openai");
    assert_eq!(provider.model(), DEFAULT_MODEL);
    assert_eq!(provider.api_url, "https://api.openai.com/v1/chat/completions");
}

#[test]
fn test_base_url_trailing_slash() {
    let provider = OpenAIProvider::with_base_url("key".to_string(), "http://localhost:8000/v1/");
    assert_eq!(provider.api_url, "http://localhost:8000/v1/chat/completions");
}

#[test]
fn test_build_request() {
    let provider = OpenAIProvider::new("key".to_string()).with_model("gpt-4o-mini");
    let request = ProviderRequest::new("Describe")
        .with_system("You are a tester")
        .with_temperature(0.3)
        .with_max_tokens(200)
        .with_json_response();

    let api = provider.build_request(&request);
    assert_eq!(api.model, "gpt-4o-mini");
    assert_eq!(api.messages.len(), 2);
    assert_eq!(api.messages[0].role, "system");
    assert_eq!(api.messages[1].content, "Describe");
    assert_eq!(api.max_tokens, Some(200));
    assert_eq!(api.temperature, Some(0.3));

    let json = serde_json::to_value(&api).unwrap();
    assert_eq!(json["response_format"]["type"], "json_object");
    assert!(json.get("stop").is_none());
}

#[test]
fn test_build_request_model_override() {
    let provider = OpenAIProvider::new("key".to_string());
    let api = provider.build_request(&ProviderRequest::new("x").with_model("o1"));
    assert_eq!(api.model, "o1");
    assert_eq!(api.messages.len(), 1);
    assert!(api.response_format.is_none());
}

#[tokio::test]
async fn test_send_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({"model": "gpt-4o"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hello back!")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let response = provider.send(ProviderRequest::new("Hello")).await.unwrap();

    assert_eq!(response.text, "Hello back!");
    assert_eq!(response.model, "gpt-4o-2024-08-06");
    assert_eq!(response.usage, Some(Usage { prompt_tokens: 12, completion_tokens: 5, total_tokens: 17 }));
    assert_eq!(response.raw["id"], "chatcmpl-123");
}

#[tokio::test]
async fn test_invalid_key_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .send(ProviderRequest::new("Hello"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderAuthentication);
    assert_eq!(err.message(), "Incorrect API key provided");
}

#[tokio::test]
async fn test_rate_limit_carries_retry_hint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_string(r#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .send(ProviderRequest::new("Hello"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderQuotaExceeded);
    assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
}

#[tokio::test]
async fn test_server_error_is_connection_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .send(ProviderRequest::new("Hello"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderConnection);
}

#[tokio::test]
async fn test_bad_request_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"error": {"message": "'messages' must contain the word 'json'"}}"#,
        ))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .send(ProviderRequest::new("Hello").with_json_response())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderResponse);
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn test_malformed_body_is_response_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .send(ProviderRequest::new("Hello"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderResponse);
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("late"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let request = ProviderRequest::new("Hello").with_timeout(Duration::from_millis(100));
    let err = provider_for(&server).send(request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn test_unreachable_is_connection_error() {
    let provider = OpenAIProvider::with_base_url("key".to_string(), "http://127.0.0.1:9");
    let err = provider.send(ProviderRequest::new("Hello")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderConnection);
}
