//! Image extraction from chat-completion responses.
//!
//! Providers embed generated images through several undocumented
//! conventions, so extraction runs an ordered chain of probes against the
//! first choice's message and stops at the first hit. Every probe is total:
//! a probe that finds nothing (or finds something it cannot load) yields
//! `None` and the chain moves on. Only exhausting the chain yields `None`
//! overall; extraction never fails the request.

use image::DynamicImage;
use regex::Regex;
use serde_json::Value;

use crate::client::{ChatResponse, MessageContent, ResponseMessage};
use crate::image::source::{load_from_base64, load_from_data_url, ImageLoader, ImageSource};

/// Markdown image link carrying a data URL: `![alt](data:image/...)`.
const MARKDOWN_IMAGE: &str = r"!\[[^\]]*\]\((data:image/[^)]+)\)";

/// Minimum length for a string to be worth a raw-base64 decode attempt.
const MIN_RAW_BASE64_LEN: usize = 100;

/// Ordered-probe image extractor.
pub struct ImageExtractor {
    loader: ImageLoader,
}

impl ImageExtractor {
    pub fn new(loader: ImageLoader) -> Self {
        Self { loader }
    }

    /// Extract an image from a chat-completion response, or `None` if no
    /// probe finds one.
    pub async fn extract(&self, response: &ChatResponse) -> Option<DynamicImage> {
        let message = response.message()?;

        if let Some(img) = self.from_images_field(message).await {
            tracing::debug!("image extracted from vendor images field");
            return Some(img);
        }
        if let Some(img) = self.from_content_parts(message).await {
            tracing::debug!("image extracted from structured content parts");
            return Some(img);
        }
        if let Some(img) = self.from_content_string(message).await {
            tracing::debug!("image extracted from string content");
            return Some(img);
        }
        if let Some(img) = from_raw_value(&response.raw) {
            tracing::debug!("image extracted from raw response value");
            return Some(img);
        }

        None
    }

    /// Probe 1: vendor-specific `images` list on the message. Entries are
    /// dicts exposing `image_url` or `url`; the first one that classifies
    /// and loads wins.
    async fn from_images_field(&self, message: &ResponseMessage) -> Option<DynamicImage> {
        for entry in &message.images {
            let Some(obj) = entry.as_object() else {
                continue;
            };
            let url = obj
                .get("image_url")
                .and_then(part_url)
                .or_else(|| obj.get("url").and_then(|v| v.as_str().map(String::from)));
            let Some(url) = url else {
                continue;
            };
            if let Some(img) = self.load_source(&url).await {
                return Some(img);
            }
        }
        None
    }

    /// Probe 2: structured content parts with `image_url` (string or
    /// `{url}`) or `inline_data.data` (raw base64).
    async fn from_content_parts(&self, message: &ResponseMessage) -> Option<DynamicImage> {
        let Some(MessageContent::Parts(parts)) = &message.content else {
            return None;
        };
        self.scan_parts(parts).await
    }

    async fn scan_parts(&self, parts: &[Value]) -> Option<DynamicImage> {
        for part in parts {
            let Some(obj) = part.as_object() else {
                continue;
            };

            if let Some(url) = obj.get("image_url").and_then(part_url) {
                if let Some(img) = self.load_source(&url).await {
                    return Some(img);
                }
            }

            if let Some(data) = obj
                .get("inline_data")
                .and_then(|v| v.get("data"))
                .and_then(|v| v.as_str())
            {
                if let Ok(img) = load_from_base64(data) {
                    return Some(img);
                }
            }
        }
        None
    }

    /// Probe 3: plain string content. Tried in order: markdown image link,
    /// whole-string data URL, JSON-encoded part list, raw base64.
    async fn from_content_string(&self, message: &ResponseMessage) -> Option<DynamicImage> {
        let Some(MessageContent::Text(content)) = &message.content else {
            return None;
        };

        if let Ok(re) = Regex::new(MARKDOWN_IMAGE) {
            if let Some(captures) = re.captures(content) {
                if let Some(data_url) = captures.get(1) {
                    if let Ok(img) = load_from_data_url(data_url.as_str()) {
                        return Some(img);
                    }
                }
            }
        }

        if content.starts_with("data:image") {
            if let Ok(img) = load_from_data_url(content) {
                return Some(img);
            }
        }

        if let Ok(Value::Array(parts)) = serde_json::from_str::<Value>(content) {
            if let Some(img) = self.scan_parts(&parts).await {
                return Some(img);
            }
        }

        if content.len() > MIN_RAW_BASE64_LEN {
            if let Ok(img) = load_from_base64(content) {
                return Some(img);
            }
        }

        None
    }

    async fn load_source(&self, raw: &str) -> Option<DynamicImage> {
        let source = ImageSource::parse(raw).ok()?;
        self.loader.load(&source).await.ok()
    }
}

/// Probe 4: navigate the raw response value directly.
///
/// Last-resort backstop: when `choices[0].message.content` is a data-URL
/// string the validated structure parses it as text and probe 3 already
/// handles it, so this only fires on response shapes the validated
/// structure fails to normalize. Kept deliberately redundant so a future
/// provider quirk degrades to a missed optimization, not a missed image.
fn from_raw_value(raw: &Value) -> Option<DynamicImage> {
    let content = raw
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()?;
    if !content.starts_with("data:image") {
        return None;
    }
    load_from_data_url(content).ok()
}

/// Read a URL out of an `image_url` value, which may be a bare string or a
/// `{url: string}` object.
fn part_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj.get("url").and_then(|v| v.as_str()).map(String::from),
        _ => None,
    }
}
