//! Outbound message construction for multi-modal requests.

use serde::Serialize;

use crate::error::Result;
use crate::image::prepare::file_to_data_url;
use crate::image::source::ImageSource;

/// A text prompt with optional reference images, in transmission order.
#[derive(Debug, Clone, Default)]
pub struct MultiModalPrompt {
    pub text: String,
    /// Image sources (file paths, URLs, or data URLs), appended to the
    /// payload in the given order.
    pub reference_images: Vec<String>,
}

impl MultiModalPrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reference_images: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: Vec<String>) -> Self {
        self.reference_images = references;
        self
    }
}

/// One structured fragment of a multi-modal message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrlPart },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrlPart {
    pub url: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrlPart { url: url.into() },
        }
    }
}

/// Message content on the wire: either a plain string or structured parts.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageBody {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A role/content pair as sent to the chat-completions endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub role: String,
    pub content: MessageBody,
}

impl OutboundMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageBody::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageBody::Text(text.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageBody::Parts(parts),
        }
    }
}

/// Resolve a reference image source to a string transmittable in an
/// `image_url` part: URLs and data URLs pass through, file paths become
/// data URLs. A missing file fails with `NotFound`.
pub fn resolve_reference(source: &str) -> Result<String> {
    match ImageSource::parse(source)? {
        ImageSource::Url(url) => Ok(url),
        ImageSource::DataUrl(data_url) => Ok(data_url),
        ImageSource::Base64(data) => Ok(data),
        ImageSource::File(path) => file_to_data_url(&path),
    }
}

/// Build a user message from a multi-modal prompt: a leading text part,
/// then one `image_url` part per reference image, order preserved.
pub fn build_user_message(prompt: &MultiModalPrompt) -> Result<OutboundMessage> {
    let mut parts = vec![ContentPart::text(&prompt.text)];
    for source in &prompt.reference_images {
        parts.push(ContentPart::image_url(resolve_reference(source)?));
    }
    Ok(OutboundMessage::user_parts(parts))
}
