//! Service-level tests against a mocked chat-completions endpoint.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lumen_core::image::prepare::encode_png;
use lumen_core::{
    ApiConfig, ChatOutcome, Error, GenerateOptions, GenerationOutcome, ImageLocation,
    ImageStore, OpenAiClient, Services,
};

fn test_config(base_url: String) -> ApiConfig {
    ApiConfig {
        api_key: "test-key".to_string(),
        base_url,
        chat_model: "chat-model".to_string(),
        image_model: "image-model".to_string(),
    }
}

fn services(server: &MockServer, store: Option<Arc<dyn ImageStore>>) -> Services {
    let client = OpenAiClient::new(test_config(server.uri())).unwrap();
    Services::new(Arc::new(client), store)
}

fn png_data_url(width: u32, height: u32) -> String {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([90, 120, 30]),
    ));
    format!(
        "data:image/png;base64,{}",
        BASE64.encode(encode_png(&img).unwrap())
    )
}

struct FailingStore;

#[async_trait::async_trait]
impl ImageStore for FailingStore {
    async fn store_image(&self, _bytes: Vec<u8>, _content_type: &str) -> lumen_core::Result<String> {
        Err(Error::Storage("bucket unreachable".to_string()))
    }
}

struct RecordingStore;

#[async_trait::async_trait]
impl ImageStore for RecordingStore {
    async fn store_image(&self, bytes: Vec<u8>, content_type: &str) -> lumen_core::Result<String> {
        assert_eq!(content_type, "image/png");
        assert!(image::load_from_memory(&bytes).is_ok());
        Ok("https://images.acct.r2.dev/image_test.png".to_string())
    }
}

#[tokio::test]
async fn chat_returns_text_and_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "model": "chat-model",
            "messages": [{"role": "user", "content": "hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello there!"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = services(&server, None).chat("hello", None, None, None).await;
    assert_eq!(
        outcome,
        ChatOutcome::Success {
            text: "Hello there!".to_string(),
            model: "chat-model".to_string(),
        }
    );
}

#[tokio::test]
async fn chat_prepends_system_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system", "content": "be terse"},
                {"role": "user", "content": "hi"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = services(&server, None)
        .chat("hi", None, Some("be terse"), None)
        .await;
    assert!(matches!(outcome, ChatOutcome::Success { .. }));
}

#[tokio::test]
async fn chat_upstream_error_becomes_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "model overloaded"}
        })))
        .mount(&server)
        .await;

    let outcome = services(&server, None)
        .chat("hello", Some("my-model"), None, None)
        .await;
    let ChatOutcome::Failure { message, model } = outcome else {
        panic!("expected failure");
    };
    assert!(message.contains("model overloaded"));
    assert_eq!(model, "my-model");
}

#[tokio::test]
async fn generate_inline_when_storage_unconfigured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "model": "image-model",
            "modalities": ["image"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": png_data_url(20, 10)}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = services(&server, None)
        .generate("a red square", GenerateOptions::default())
        .await;

    let GenerationOutcome::Success {
        location: ImageLocation::Inline(b64),
        model,
        warning,
    } = outcome
    else {
        panic!("expected inline success");
    };
    assert_eq!(model, "image-model");
    assert!(warning.is_none());

    let decoded = image::load_from_memory(&BASE64.decode(b64).unwrap()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (20, 10));
}

#[tokio::test]
async fn generate_uploads_when_storage_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": png_data_url(4, 4)}}]
        })))
        .mount(&server)
        .await;

    let outcome = services(&server, Some(Arc::new(RecordingStore)))
        .generate("a dot", GenerateOptions::default())
        .await;

    let GenerationOutcome::Success { location, warning, .. } = outcome else {
        panic!("expected success");
    };
    assert_eq!(
        location,
        ImageLocation::Url("https://images.acct.r2.dev/image_test.png".to_string())
    );
    assert!(warning.is_none());
}

#[tokio::test]
async fn upload_failure_downgrades_to_inline_with_warning() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": png_data_url(4, 4)}}]
        })))
        .mount(&server)
        .await;

    let outcome = services(&server, Some(Arc::new(FailingStore)))
        .generate("a dot", GenerateOptions::default())
        .await;

    let GenerationOutcome::Success {
        location: ImageLocation::Inline(_),
        warning: Some(warning),
        ..
    } = outcome
    else {
        panic!("upload failure must not fail the request");
    };
    assert!(warning.contains("bucket unreachable"));
}

#[tokio::test]
async fn generate_without_image_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Sorry, I can only describe it."}}]
        })))
        .mount(&server)
        .await;

    let outcome = services(&server, None)
        .generate("a dot", GenerateOptions::default())
        .await;

    assert_eq!(
        outcome,
        GenerationOutcome::Failure {
            message: "No image generated".to_string(),
            model: "image-model".to_string(),
        }
    );
}

#[tokio::test]
async fn generate_sends_aspect_ratio_and_resolution_when_set() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "aspect_ratio": "16:9",
            "resolution": "2K"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": png_data_url(2, 2)}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = GenerateOptions {
        aspect_ratio: Some("16:9".to_string()),
        resolution: Some("2K".to_string()),
        ..Default::default()
    };
    let outcome = services(&server, None).generate("wide", options).await;
    assert!(matches!(outcome, GenerationOutcome::Success { .. }));
}

#[tokio::test]
async fn generate_downscales_reference_images() {
    let dir = tempfile::tempdir().unwrap();
    let big = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        3000,
        2000,
        image::Rgb([5, 5, 5]),
    ));
    let path = dir.path().join("big.png");
    std::fs::write(&path, encode_png(&big).unwrap()).unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(wiremock::matchers::path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": png_data_url(2, 2)}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = GenerateOptions {
        reference_images: vec![path.to_string_lossy().into_owned()],
        ..Default::default()
    };
    let outcome = services(&server, None).generate("in this style", options).await;
    assert!(matches!(outcome, GenerationOutcome::Success { .. }));

    // The reference part must be a JPEG data URL whose longer edge was
    // capped at 1024.
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let url = body["messages"][0]["content"][1]["image_url"]["url"]
        .as_str()
        .unwrap();
    assert!(url.starts_with("data:image/jpeg;base64,"));
    let payload = url.split_once(',').unwrap().1;
    let reference = image::load_from_memory(&BASE64.decode(payload).unwrap()).unwrap();
    assert!(reference.width().max(reference.height()) <= 1024);
}

#[tokio::test]
async fn missing_reference_image_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let options = GenerateOptions {
        reference_images: vec!["/no/such/reference.png".to_string()],
        ..Default::default()
    };
    let outcome = services(&server, None).generate("styled", options).await;

    let GenerationOutcome::Failure { message, model } = outcome else {
        panic!("expected failure");
    };
    assert!(message.contains("not found"));
    assert_eq!(model, "image-model");
}
