//! `POST /chat` contract tests against a mocked Gemini REST API.

mod common;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ai_calling_agent::ServerConfig;
use common::spawn_app;

fn config_for(mock: &MockServer) -> ServerConfig {
    ServerConfig {
        gemini_api_key: Some("test-key".to_string()),
        api_base: mock.uri(),
        ..Default::default()
    }
}

fn candidate_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn chat_returns_upstream_reply_verbatim() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "Hello, how are you?"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_reply("Doing great!")))
        .expect(1)
        .mount(&mock)
        .await;

    let addr = spawn_app(config_for(&mock)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/chat"))
        .json(&json!({"message": "Hello, how are you?"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["reply"], "Doing great!");
    assert_eq!(body["model"], "gemini-2.5-flash");
}

#[tokio::test]
async fn chat_forwards_history_and_system_instruction() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(body_partial_json(json!({
            "contents": [
                {"role": "user", "parts": [{"text": "Hello"}]},
                {"role": "model", "parts": [{"text": "Hi!"}]},
                {"role": "user", "parts": [{"text": "What did I say first?"}]}
            ],
            "systemInstruction": {"parts": [{"text": "Answer in one word."}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_reply("Hello")))
        .expect(1)
        .mount(&mock)
        .await;

    let addr = spawn_app(config_for(&mock)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/chat"))
        .json(&json!({
            "message": "What did I say first?",
            "history": [
                {"role": "user", "content": "Hello"},
                {"role": "model", "content": "Hi!"}
            ],
            "system_instruction": "Answer in one word."
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["reply"], "Hello");
}

#[tokio::test]
async fn chat_rejects_malformed_body() {
    let mock = MockServer::start().await;
    let addr = spawn_app(config_for(&mock)).await;
    let client = reqwest::Client::new();

    // Not JSON at all
    let response = client
        .post(format!("http://{addr}/chat"))
        .header("content-type", "application/json")
        .body("{\"message\":")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    // JSON but missing the message field
    let response = client
        .post(format!("http://{addr}/chat"))
        .json(&json!({"history": []}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    // Whitespace-only message
    let response = client
        .post(format!("http://{addr}/chat"))
        .json(&json!({"message": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn chat_maps_upstream_failure_to_502() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&mock)
        .await;

    let addr = spawn_app(config_for(&mock)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/chat"))
        .json(&json!({"message": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn chat_maps_empty_candidates_to_502() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&mock)
        .await;

    let addr = spawn_app(config_for(&mock)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/chat"))
        .json(&json!({"message": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
}

#[tokio::test]
async fn chat_without_api_key_is_500() {
    let addr = spawn_app(ServerConfig::default()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/chat"))
        .json(&json!({"message": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
}
