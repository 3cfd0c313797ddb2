//! HTTP behaviour of `OpenAiClient` against a local mock server.

use chatgpt_core::{CompletionClient, CompletionError, Turn};
use chatgpt_providers::OpenAiClient;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, timeout: Duration) -> OpenAiClient {
    OpenAiClient::new("sk-test".to_string(), "gpt-4.1-mini".to_string(), timeout)
        .expect("client should build")
        .with_base_url(format!("{}/v1/", server.uri()))
}

fn reply_body(text: &str) -> serde_json::Value {
    json!({
        "id": "resp_123",
        "object": "response",
        "status": "completed",
        "output": [{
            "type": "message",
            "id": "msg_1",
            "role": "assistant",
            "content": [{ "type": "output_text", "text": text, "annotations": [] }]
        }]
    })
}

#[tokio::test]
async fn sends_model_and_ordered_turns() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_json(json!({
            "model": "gpt-4.1-mini",
            "input": [
                { "role": "system", "content": "Be brief." },
                { "role": "user", "content": "explain bfs" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("BFS is...")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let turns = [Turn::system("Be brief."), Turn::user("explain bfs")];

    let reply = client.complete(&turns).await.expect("request should succeed");
    assert_eq!(reply, "BFS is...");
}

#[tokio::test]
async fn too_many_requests_is_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "Rate limit reached for gpt-4.1-mini", "type": "requests" }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let err = client.complete(&[Turn::user("hi")]).await.unwrap_err();

    assert_eq!(
        err,
        CompletionError::RateLimit {
            message: "Rate limit reached for gpt-4.1-mini".to_string()
        }
    );
}

#[tokio::test]
async fn server_error_is_api_error_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided" }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let err = client.complete(&[Turn::user("hi")]).await.unwrap_err();

    assert_eq!(
        err,
        CompletionError::Api {
            status: 401,
            message: "Incorrect API key provided".to_string()
        }
    );
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let err = client.complete(&[Turn::user("hi")]).await.unwrap_err();

    assert!(matches!(err, CompletionError::MalformedResponse(_)));
}

#[tokio::test]
async fn slow_server_times_out_as_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(reply_body("late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_millis(300));
    let err = client.complete(&[Turn::user("hi")]).await.unwrap_err();

    assert!(matches!(err, CompletionError::Network(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    let client = OpenAiClient::new(
        "sk-test".to_string(),
        "gpt-4.1-mini".to_string(),
        Duration::from_secs(2),
    )
    .expect("client should build")
    .with_base_url("http://127.0.0.1:9".to_string());

    let err = client.complete(&[Turn::user("hi")]).await.unwrap_err();
    assert!(matches!(err, CompletionError::Network(_)));
}
