use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use thai_flow_lib::core::features::translator::{GeminiClient, TextGenerator, TranslatorService};
use thai_flow_lib::shared::error::AppError;
use thai_flow_lib::shared::settings::ApiSettings;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-test";
const ENDPOINT: &str = "/v1beta/models/gemini-test:generateContent";

fn settings(base_url: &str) -> ApiSettings {
    ApiSettings {
        model: MODEL.to_string(),
        base_url: base_url.to_string(),
        timeout_secs: 5,
        gemini_api_key: Some("test-key".to_string()),
    }
}

fn translator(server: &MockServer) -> TranslatorService {
    let client = GeminiClient::new(&settings(&server.uri())).unwrap();
    TranslatorService::new(Arc::new(client), MODEL)
}

fn reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn sends_prompt_with_api_key_and_returns_trimmed_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("  สวัสดีครับ เป็นอย่างไรบ้างครับ\n")))
        .expect(1)
        .mount(&server)
        .await;

    let translated = translator(&server).translate("Hello, how are you?").await.unwrap();
    assert_eq!(translated, "สวัสดีครับ เป็นอย่างไรบ้างครับ");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("natural-sounding Thai"));
    assert!(prompt.ends_with("\"Hello, how are you?\""));
}

#[tokio::test]
async fn blank_input_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("x")))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(translator(&server).translate("  \n ").await.unwrap(), "");
}

#[tokio::test]
async fn response_without_text_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"promptFeedback": {"blockReason": "OTHER"}})),
        )
        .mount(&server)
        .await;

    assert_eq!(translator(&server).translate("Hello").await.unwrap(), "");
}

#[tokio::test]
async fn http_errors_become_translation_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": {"message": "API key not valid"}})))
        .mount(&server)
        .await;

    let err = translator(&server).translate("Hello").await.unwrap_err();
    assert!(matches!(err, AppError::TranslationFailure));
}

#[tokio::test]
async fn malformed_body_becomes_translation_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = translator(&server).translate("Hello").await.unwrap_err();
    assert!(matches!(err, AppError::TranslationFailure));
}

#[tokio::test]
async fn client_reports_status_detail_before_it_is_collapsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(json!({"contents": [{"parts": [{"text": "ping"}]}]})))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&settings(&server.uri())).unwrap();
    let err = client.generate(MODEL, "ping").await.unwrap_err();
    match err {
        AppError::Network(msg) => {
            assert!(msg.contains("500"), "{msg}");
            assert!(msg.contains("upstream down"), "{msg}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
