//! Service entry points for the two MCP tools.
//!
//! Both entry points fold every error into their outcome type's `Failure`
//! arm; nothing here propagates an `Err` to the tool layer.

use std::path::Path;
use std::sync::Arc;

use crate::client::{ChatRequest, OpenAiClient};
use crate::error::Result;
use crate::image::prepare::{encode_png, image_to_base64, reference_to_data_url};
use crate::image::{ImageExtractor, ImageLoader};
use crate::message::{ContentPart, OutboundMessage};
use crate::storage::ImageStore;

/// Where a generated image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLocation {
    /// Public URL of the uploaded object.
    Url(String),
    /// Base64-encoded JPEG, returned inline.
    Inline(String),
}

impl ImageLocation {
    /// The URL or base64 payload, whichever this is.
    pub fn into_inner(self) -> String {
        match self {
            ImageLocation::Url(url) => url,
            ImageLocation::Inline(data) => data,
        }
    }
}

/// Outcome of a chat call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Success { text: String, model: String },
    Failure { message: String, model: String },
}

/// Outcome of an image-generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success {
        location: ImageLocation,
        model: String,
        /// Non-fatal problem, currently only a failed storage upload that
        /// was downgraded to an inline result.
        warning: Option<String>,
    },
    Failure {
        message: String,
        model: String,
    },
}

/// Optional knobs for image generation.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub reference_images: Vec<String>,
    pub aspect_ratio: Option<String>,
    pub resolution: Option<String>,
    pub model: Option<String>,
}

/// The chat and generation services, sharing one API client and an
/// optional image store.
pub struct Services {
    client: Arc<OpenAiClient>,
    store: Option<Arc<dyn ImageStore>>,
}

impl Services {
    pub fn new(client: Arc<OpenAiClient>, store: Option<Arc<dyn ImageStore>>) -> Self {
        Self { client, store }
    }

    /// Whether generated images will be uploaded to object storage.
    pub fn storage_configured(&self) -> bool {
        self.store.is_some()
    }

    /// Single-turn text chat, optionally system-prefixed.
    ///
    /// `temperature` is omitted from the request when unset so the remote
    /// default applies.
    pub async fn chat(
        &self,
        message: &str,
        model: Option<&str>,
        system_prompt: Option<&str>,
        temperature: Option<f32>,
    ) -> ChatOutcome {
        let model = model
            .unwrap_or(&self.client.config().chat_model)
            .to_string();

        match self
            .chat_inner(message, &model, system_prompt, temperature)
            .await
        {
            Ok(text) => ChatOutcome::Success { text, model },
            Err(e) => {
                tracing::warn!(error = %e, %model, "chat request failed");
                ChatOutcome::Failure {
                    message: e.to_string(),
                    model,
                }
            }
        }
    }

    async fn chat_inner(
        &self,
        message: &str,
        model: &str,
        system_prompt: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(OutboundMessage::system(system));
        }
        messages.push(OutboundMessage::user(message));

        let mut request = ChatRequest::new(model, messages);
        request.temperature = temperature;

        let response = self.client.chat_completions(&request).await?;
        response
            .text()
            .map(String::from)
            .ok_or_else(|| crate::error::Error::upstream("response contained no text content"))
    }

    /// Generate an image from a prompt and optional reference images.
    pub async fn generate(&self, prompt: &str, options: GenerateOptions) -> GenerationOutcome {
        let model = options
            .model
            .clone()
            .unwrap_or_else(|| self.client.config().image_model.clone());

        match self.generate_inner(prompt, &options, &model).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, %model, "image generation failed");
                GenerationOutcome::Failure {
                    message: e.to_string(),
                    model,
                }
            }
        }
    }

    async fn generate_inner(
        &self,
        prompt: &str,
        options: &GenerateOptions,
        model: &str,
    ) -> Result<GenerationOutcome> {
        let mut parts = vec![ContentPart::text(prompt)];
        for reference in &options.reference_images {
            // A missing reference file is a caller mistake, not something
            // to skip silently.
            parts.push(ContentPart::image_url(reference_to_data_url(Path::new(
                reference,
            ))?));
        }

        let mut request = ChatRequest::new(model, vec![OutboundMessage::user_parts(parts)]);
        request.modalities = Some(vec!["image".to_string()]);
        request.aspect_ratio = options.aspect_ratio.clone();
        request.resolution = options.resolution.clone();

        let response = self.client.chat_completions(&request).await?;

        let extractor = ImageExtractor::new(ImageLoader::new(self.client.http().clone()));
        let Some(image) = extractor.extract(&response).await else {
            return Ok(GenerationOutcome::Failure {
                message: "No image generated".to_string(),
                model: model.to_string(),
            });
        };

        let Some(store) = &self.store else {
            return Ok(GenerationOutcome::Success {
                location: ImageLocation::Inline(image_to_base64(&image)?),
                model: model.to_string(),
                warning: None,
            });
        };

        match store.store_image(encode_png(&image)?, "image/png").await {
            Ok(url) => Ok(GenerationOutcome::Success {
                location: ImageLocation::Url(url),
                model: model.to_string(),
                warning: None,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "upload failed, falling back to inline base64");
                Ok(GenerationOutcome::Success {
                    location: ImageLocation::Inline(image_to_base64(&image)?),
                    model: model.to_string(),
                    warning: Some(format!("Upload failed: {}", e)),
                })
            }
        }
    }
}
