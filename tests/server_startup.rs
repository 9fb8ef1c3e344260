//! Startup and contract tests for the HTTP surface that needs no upstream.

mod common;

use common::{spawn_app, test_config};

#[tokio::test]
async fn health_returns_fixed_payload() {
    let addr = spawn_app(test_config()).await;

    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "ai-calling-agent");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn health_does_not_depend_on_api_key() {
    // No GEMINI_API_KEY configured at all
    let addr = spawn_app(ai_calling_agent::ServerConfig::default()).await;

    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn index_lists_endpoints() {
    let addr = spawn_app(test_config()).await;

    let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["endpoints"]["chat"], "/chat");
    assert_eq!(body["endpoints"]["voice"], "/ws/voice");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let addr = spawn_app(test_config()).await;

    let response = reqwest::get(format!("http://{addr}/nope")).await.unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn twilio_incoming_returns_stream_twiml() {
    let addr = spawn_app(test_config()).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/twilio/incoming"))
        .form(&[("CallSid", "CA123"), ("From", "+15550001111")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/xml"
    );

    let body = response.text().await.unwrap();
    assert!(body.starts_with("<?xml"));
    assert!(body.contains("<Say>"));
    // The stream URL points back at this host over plain ws (no TLS configured)
    assert!(body.contains(&format!("<Stream url=\"ws://{addr}/twilio/media\" />")));
}
