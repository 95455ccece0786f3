//! MCP tool input/output type definitions.
//!
//! These types are used with `schemars::JsonSchema` to generate the JSON
//! Schema that MCP clients use to understand tool parameters.

use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

/// Input for the chat tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ChatInput {
    /// The user's message.
    pub message: String,

    /// Model to use. Defaults to the configured chat model.
    #[serde(default)]
    pub model: Option<String>,

    /// Optional system prompt, sent before the user message.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// Input for the make_images tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MakeImagesInput {
    /// Text prompt describing the image.
    pub message: String,

    /// Optional reference image paths; each is inlined into the request
    /// in order. A path that does not exist fails the call.
    #[serde(default)]
    pub reference_images: Option<Vec<String>>,

    /// Model to use. Defaults to the configured image model.
    #[serde(default)]
    pub model: Option<String>,

    /// Aspect ratio such as "1:1" or "16:9". Omitted when unset.
    #[serde(default)]
    pub aspect_ratio: Option<String>,

    /// Resolution such as "1K", "2K", or "4K". Omitted when unset.
    #[serde(default)]
    pub resolution: Option<String>,
}

/// Result of the make_images tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MakeImagesResult {
    /// Whether an image was produced.
    pub success: bool,

    /// Public URL of the uploaded image, or base64 data when object
    /// storage is not configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,

    /// Model that produced the image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Error message when success is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Non-fatal problem, e.g. a failed upload that fell back to base64.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
