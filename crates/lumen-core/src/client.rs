//! OpenAI-compatible chat-completions HTTP client.
//!
//! The upstream is an OpenAI-style endpoint fronting another provider's
//! models, so the response shape is validated into an optional-field
//! structure rather than a strict schema, and the raw JSON is retained for
//! the last-resort extraction probe.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::message::OutboundMessage;

/// Client for an OpenAI-compatible chat-completions endpoint.
///
/// Constructed once at process start and shared by reference; the inner
/// reqwest client is never mutated after construction.
pub struct OpenAiClient {
    http: Client,
    config: ApiConfig,
}

/// A chat-completions request, including the vendor extension fields used
/// for image generation. Unset options are omitted from the wire entirely
/// so the remote service's own defaults apply.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<OutboundMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<OutboundMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            modalities: None,
            aspect_ratio: None,
            resolution: None,
        }
    }
}

/// Validated chat-completion structure. Every field is optional-by-default:
/// providers embed images through several undocumented conventions and may
/// omit anything.
#[derive(Debug, Default, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: ResponseMessage,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<MessageContent>,
    /// Vendor-specific image list, shape unspecified.
    #[serde(default)]
    pub images: Vec<Value>,
}

/// Message content as returned by the provider: a plain string or a list
/// of loosely-structured parts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<Value>),
}

/// A parsed response together with the raw JSON it came from.
#[derive(Debug)]
pub struct ChatResponse {
    pub completion: ChatCompletion,
    pub raw: Value,
}

impl ChatResponse {
    /// The first choice's message, if any.
    pub fn message(&self) -> Option<&ResponseMessage> {
        self.completion.choices.first().map(|c| &c.message)
    }

    /// The first choice's text content, if the content is a plain string.
    pub fn text(&self) -> Option<&str> {
        match self.message()?.content.as_ref()? {
            MessageContent::Text(text) => Some(text),
            MessageContent::Parts(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    error: UpstreamErrorDetail,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorDetail {
    message: String,
}

impl OpenAiClient {
    /// Create a new client with the bearer credential installed as a
    /// default header.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth: reqwest::header::HeaderValue =
            format!("Bearer {}", config.api_key)
                .parse()
                .map_err(|_| Error::Configuration("Invalid API key format".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Create a client from environment configuration.
    pub fn from_env() -> Result<Self> {
        Self::new(ApiConfig::from_env()?)
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// The underlying reqwest client, for collaborators that fetch images.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Issue a chat-completions call.
    ///
    /// No client-side timeout or retry: a hang upstream is fatal to the
    /// single request, and cancellation from the host aborts the in-flight
    /// call.
    pub async fn chat_completions(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        tracing::debug!(model = %request.model, "sending chat completion request");

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::upstream(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::upstream(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<UpstreamErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.clone());
            return Err(Error::upstream(format!("{}: {}", status, message)));
        }

        let raw: Value = serde_json::from_str(&body)
            .map_err(|e| Error::upstream(format!("response is not JSON: {}", e)))?;
        let completion: ChatCompletion = serde_json::from_value(raw.clone())
            .map_err(|e| Error::upstream(format!("unexpected response shape: {}", e)))?;

        Ok(ChatResponse { completion, raw })
    }
}
