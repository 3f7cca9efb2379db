use crate::{OpenAiClient, OpenAiConfig};
use agentdeck_core::{CompletionRequest, LlmClient};
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> CompletionRequest {
    CompletionRequest::for_agent(
        "gpt-4o-mini-2024-07-18",
        Some("You are helpful"),
        "Hello",
        0.7,
        100,
    )
}

fn client(server: &MockServer) -> OpenAiClient {
    OpenAiClient::with_base_url(format!("{}/v1/", server.uri())).unwrap()
}

#[tokio::test]
async fn test_completion_returns_first_choice_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini-2024-07-18",
            "stream": false,
            "max_tokens": 100,
            "messages": [
                {"role": "system", "content": "You are helpful"},
                {"role": "user", "content": "Hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Hi there"}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let completion = client(&server).chat_completion(request()).await.unwrap();
    assert_eq!(completion.content, "Hi there");
    assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
    let usage = completion.usage.unwrap();
    assert_eq!(usage.prompt_tokens, 5);
    assert_eq!(usage.completion_tokens, 3);
    assert_eq!(usage.total_tokens, 8);
}

#[tokio::test]
async fn test_error_status_is_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"message": "overloaded"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).chat_completion(request()).await.unwrap_err();
    assert_eq!(err.status, Some(503));
    assert!(err.message.contains("overloaded"));
}

#[tokio::test]
async fn test_transport_failure_has_no_status() {
    let client = OpenAiClient::with_base_url("http://127.0.0.1:1/v1").unwrap();
    let err = client.chat_completion(request()).await.unwrap_err();
    assert_eq!(err.status, None);
}

#[tokio::test]
async fn test_stream_concatenates_deltas_and_skips_malformed_chunks() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        "data: not-json\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
        "data: [DONE]\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"after done\"}}]}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let stream = client(&server)
        .chat_completion_stream(request())
        .await
        .unwrap();
    let fragments: Vec<String> = stream.map(|r| r.unwrap()).collect().await;
    assert_eq!(fragments, vec!["Hel".to_string(), "lo".to_string()]);
}

#[tokio::test]
async fn test_stream_error_status_fails_before_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let err = match client(&server).chat_completion_stream(request()).await {
        Ok(_) => panic!("expected an error"),
        Err(err) => err,
    };
    assert_eq!(err.status, Some(429));
    assert!(err.message.contains("slow down"));
}

#[tokio::test]
async fn test_list_models_accepts_wrapped_and_bare_shapes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "gpt-4o", "context_length": 128000}, {"id": "mistral"}]
        })))
        .mount(&server)
        .await;

    let models = client(&server).list_models().await.unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].context_length, Some(128000));
    assert_eq!(models[1].context_length, None);

    let bare = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "qwen"}])))
        .mount(&bare)
        .await;

    let models = client(&bare).list_models().await.unwrap();
    assert_eq!(models[0].id, "qwen");
}

#[tokio::test]
async fn test_token_takes_precedence_over_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("authorization", "Bearer personal-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let config = OpenAiConfig {
        base_url: format!("{}/v1", server.uri()),
        api_key: "unused".to_string(),
        token: Some("personal-token".to_string()),
        timeout: None,
    };
    let client = OpenAiClient::new(config).unwrap();
    assert!(client.list_models().await.unwrap().is_empty());
}

#[test]
fn test_default_config_targets_llm7() {
    let config = OpenAiConfig::default();
    assert_eq!(config.base_url, "https://llm7.io/v1");
    assert_eq!(config.credential(), "unused");
}
