//! Integration tests for the chat generator against a mocked endpoint.

use serde_json::{json, Value};
use umbra_core::config::LlmConfig;
use umbra_core::Generator;
use umbra_reasoning::{ChatGenerator, PersonaPrompt, NO_MEMORIES_LINE};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn config(base_url: &str) -> LlmConfig {
    LlmConfig {
        base_url: base_url.to_string(),
        model: "deepseek-reasoner".to_string(),
        timeout_secs: 5,
        ..LlmConfig::default()
    }
}

fn generator(server: &MockServer) -> ChatGenerator {
    let persona = PersonaPrompt::new("Carla", "@carla_shadow", 280);
    ChatGenerator::new("sk-test", &config(&server.uri()), persona).unwrap()
}

fn completion(content: &str) -> Value {
    json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "reasoning_content": "thinking...",
                "content": content,
            },
            "finish_reason": "stop",
        }]
    })
}

#[tokio::test]
async fn test_generate_parses_fenced_reply() {
    let server = MockServer::start().await;
    let reply = "```json\n{\"thought_process\": \"inverted\", \"tweet_content\": \"Entropy is the real roadmap.\", \"new_valence_delta\": -0.2, \"new_arousal_delta\": 0.4}\n```";
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(reply)))
        .expect(1)
        .mount(&server)
        .await;

    let thought = generator(&server)
        .generate("Shipping on schedule feels great", "analytical/detached", &[])
        .await
        .unwrap();
    assert_eq!(thought.content, "Entropy is the real roadmap.");
    assert_eq!(thought.rationale, "inverted");
    assert!((thought.valence_delta + 0.2).abs() < 1e-6);
    assert!((thought.arousal_delta - 0.4).abs() < 1e-6);
}

#[tokio::test]
async fn test_request_carries_prompt_and_memories() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"tweet_content": "ok"}"#)))
        .mount(&server)
        .await;

    let memories = vec!["I said: order is overrated".to_string()];
    generator(&server)
        .generate("Clean code matters", "serene/zen — benevolent, peaceful", &memories)
        .await
        .unwrap();

    let requests: Vec<Request> = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "deepseek-reasoner");
    assert_eq!(body["stream"], false);
    let system = body["messages"][0]["content"].as_str().unwrap();
    assert!(system.contains("State: serene/zen"));
    assert!(system.contains("- I said: order is overrated"));
    assert!(!system.contains(NO_MEMORIES_LINE));
    let user = body["messages"][1]["content"].as_str().unwrap();
    assert_eq!(user, "Incoming post: 'Clean code matters'");
}

#[tokio::test]
async fn test_invalid_json_reply_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("I'd rather not.")))
        .mount(&server)
        .await;

    assert!(generator(&server).generate("x", "y", &[]).await.is_err());
}

#[tokio::test]
async fn test_http_error_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = generator(&server).generate("x", "y", &[]).await.unwrap_err();
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_missing_content_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    assert!(generator(&server).generate("x", "y", &[]).await.is_err());
}
