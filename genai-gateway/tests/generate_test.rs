mod common;

use axum::http::StatusCode;
use common::{file_part, jpeg_bytes, test_config, TestApp, TEST_MODEL};
use genai_gateway::config::{DEFAULT_AUDIO_PROMPT, DEFAULT_DOCUMENT_PROMPT};
use genai_gateway::services::providers::mock::{MockBehavior, MockTextProvider};
use genai_gateway::services::providers::{ContentPart, ProviderError};
use reqwest::multipart::Form;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn generate_text_relays_provider_output() {
    let app = TestApp::spawn(MockTextProvider::replying("Hello!")).await;

    let response = app.post_text(json!({ "prompt": "Say hello" })).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!({ "result": "Hello!" }));

    let calls = app.provider.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].model, TEST_MODEL);
    assert_eq!(calls[0].parts, vec![ContentPart::text("Say hello")]);
}

#[tokio::test]
async fn generate_text_reports_provider_failure_as_500() {
    let app = TestApp::spawn(MockTextProvider::failing(ProviderError::NetworkError(
        "connection reset".to_string(),
    )))
    .await;

    let response = app.post_text(json!({ "prompt": "Say hello" })).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["message"], "Network error: connection reset");
}

#[tokio::test]
async fn generate_text_rejects_missing_or_blank_prompt() {
    let app = TestApp::spawn(MockTextProvider::replying("unused")).await;

    for body in [json!({}), json!({ "prompt": "" }), json!({ "prompt": "   " })] {
        let response = app.post_text(body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert!(body["message"].is_string());
    }

    assert!(app.provider.calls().await.is_empty());
}

#[tokio::test]
async fn generate_text_rejects_malformed_json_with_json_error() {
    let app = TestApp::spawn(MockTextProvider::replying("unused")).await;

    let response = app
        .client
        .post(format!("{}/generate-text", app.address))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn image_without_prompt_relays_provider_error_message() {
    let app = TestApp::spawn(MockTextProvider::failing(ProviderError::api(
        429,
        "quota exceeded",
    )))
    .await;

    let form = Form::new().part("image", file_part(jpeg_bytes(), "photo.jpg", "image/jpeg"));
    let response = app.post_form("/generate-from-image", form).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!({ "message": "quota exceeded" }));

    let calls = app.provider.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].parts.len(), 1);
    assert!(!calls[0].parts[0].is_text());
}

#[tokio::test]
async fn image_with_prompt_sends_text_then_inline_data() {
    let app = TestApp::spawn(MockTextProvider::replying("A small cat.")).await;

    let form = Form::new()
        .text("prompt", "What is in this picture?")
        .part("image", file_part(jpeg_bytes(), "photo.jpg", "image/jpeg"));
    let response = app.post_form("/generate-from-image", form).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(!body["result"].as_str().unwrap_or_default().is_empty());

    let calls = app.provider.calls().await;
    let parts = &calls[0].parts;
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0], ContentPart::text("What is in this picture?"));
    match &parts[1] {
        ContentPart::InlineData { inline_data } => {
            assert_eq!(inline_data.mime_type, "image/jpeg");
            assert_eq!(inline_data.decode().unwrap(), jpeg_bytes());
        }
        other => panic!("expected inline data, got {:?}", other),
    }
}

#[tokio::test]
async fn document_without_prompt_uses_summary_default() {
    let app = TestApp::spawn(MockTextProvider::replying("Summary.")).await;

    let form = Form::new().part(
        "document",
        file_part(b"%PDF-1.4 minimal".to_vec(), "report.pdf", "application/pdf"),
    );
    let response = app.post_form("/generate-from-document", form).await;

    assert_eq!(response.status(), StatusCode::OK);

    let calls = app.provider.calls().await;
    assert_eq!(calls[0].parts.len(), 2);
    assert_eq!(calls[0].parts[0], ContentPart::text(DEFAULT_DOCUMENT_PROMPT));
}

#[tokio::test]
async fn audio_without_prompt_uses_transcript_default() {
    let app = TestApp::spawn(MockTextProvider::replying("Transcript.")).await;

    let form = Form::new().part(
        "audio",
        file_part(vec![0x49, 0x44, 0x33, 0x03], "memo.mp3", "audio/mpeg"),
    );
    let response = app.post_form("/generate-from-audio", form).await;

    assert_eq!(response.status(), StatusCode::OK);

    let calls = app.provider.calls().await;
    assert_eq!(calls[0].parts[0], ContentPart::text(DEFAULT_AUDIO_PROMPT));
    match &calls[0].parts[1] {
        ContentPart::InlineData { inline_data } => assert_eq!(inline_data.mime_type, "audio/mpeg"),
        other => panic!("expected inline data, got {:?}", other),
    }
}

#[tokio::test]
async fn media_endpoint_without_attachment_is_client_error() {
    let app = TestApp::spawn(MockTextProvider::replying("unused")).await;

    let form = Form::new().text("prompt", "Summarize please");
    let response = app.post_form("/generate-from-document", form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["message"], "missing `document` file");
    assert!(app.provider.calls().await.is_empty());
}

#[tokio::test]
async fn media_endpoint_rejects_wrong_media_type() {
    let app = TestApp::spawn(MockTextProvider::replying("unused")).await;

    let form = Form::new().part("audio", file_part(jpeg_bytes(), "photo.jpg", "image/jpeg"));
    let response = app.post_form("/generate-from-audio", form).await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(app.provider.calls().await.is_empty());
}

#[tokio::test]
async fn media_endpoint_rejects_oversized_attachment() {
    let mut config = test_config();
    config.limits.max_attachment_bytes = 16;
    let app = TestApp::spawn_with_config(config, MockTextProvider::replying("unused")).await;

    let form = Form::new().part("image", file_part(vec![0xAB; 64], "big.png", "image/png"));
    let response = app.post_form("/generate-from-image", form).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.provider.calls().await.is_empty());
}

#[tokio::test]
async fn media_endpoint_rejects_duplicate_attachment() {
    let app = TestApp::spawn(MockTextProvider::replying("unused")).await;

    let form = Form::new()
        .part("image", file_part(jpeg_bytes(), "first.jpg", "image/jpeg"))
        .part("image", file_part(jpeg_bytes(), "second.jpg", "image/jpeg"));
    let response = app.post_form("/generate-from-image", form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["message"], "only one `image` file may be uploaded");
    assert!(app.provider.calls().await.is_empty());
}

#[tokio::test]
async fn generate_text_rejects_oversized_body() {
    let mut config = test_config();
    config.limits.max_attachment_bytes = 16;
    let app = TestApp::spawn_with_config(config, MockTextProvider::replying("unused")).await;

    let prompt = "a".repeat(2 * 1024 * 1024);
    let response = app.post_text(json!({ "prompt": prompt })).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["message"].is_string());
    assert!(app.provider.calls().await.is_empty());
}

#[tokio::test]
async fn media_endpoint_rejects_non_multipart_body() {
    let app = TestApp::spawn(MockTextProvider::replying("unused")).await;

    let response = app
        .client
        .post(format!("{}/generate-from-image", app.address))
        .json(&json!({ "prompt": "hi" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn hung_provider_times_out_as_server_error() {
    let mut config = test_config();
    config.provider.timeout = Duration::from_millis(50);
    let app = TestApp::spawn_with_config(config, MockTextProvider::new(MockBehavior::Hang)).await;

    let response = app.post_text(json!({ "prompt": "Say hello" })).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("did not respond"));
}

#[tokio::test]
async fn hidden_provider_errors_are_masked() {
    let mut config = test_config();
    config.provider.expose_errors = false;
    let app = TestApp::spawn_with_config(
        config,
        MockTextProvider::failing(ProviderError::api(403, "API key sk-123 revoked")),
    )
    .await;

    let response = app.post_text(json!({ "prompt": "Say hello" })).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!({ "message": "Generation failed" }));
}

#[tokio::test]
async fn concurrent_requests_are_independent() {
    let app = TestApp::spawn(MockTextProvider::replying("ok")).await;

    let requests = (0..8).map(|i| app.post_text(json!({ "prompt": format!("prompt {}", i) })));
    let responses = futures::future::join_all(requests).await;

    assert!(responses.iter().all(|r| r.status() == StatusCode::OK));
    assert_eq!(app.provider.calls().await.len(), 8);
}
