//! Environment-sourced configuration for lumen.

use crate::error::{Error, Result};

/// Default OpenAI-compatible endpoint (Google AI compatibility layer).
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";

/// Default model for text chat.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Default model for image generation.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

/// Configuration for the OpenAI-compatible API client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bearer credential for the upstream API.
    pub api_key: String,
    /// Base URL of the chat-completions endpoint.
    pub base_url: String,
    /// Default model for the chat tool.
    pub chat_model: String,
    /// Default model for the image-generation tool.
    pub image_model: String,
}

impl ApiConfig {
    /// Load API configuration from environment variables.
    ///
    /// `OPENAI_API_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Configuration(
                    "OPENAI_API_KEY environment variable is required".to_string(),
                )
            })?;

        Ok(Self {
            api_key,
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            chat_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            image_model: std::env::var("IMAGE_MODEL")
                .unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string()),
        })
    }
}

/// Cloudflare R2 (S3-compatible) storage configuration.
///
/// Storage is considered configured only when all four credentials are
/// present; a partial set is treated the same as none.
#[derive(Debug, Clone)]
pub struct R2Config {
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    /// Optional custom domain for public URLs.
    pub public_domain: Option<String>,
}

impl R2Config {
    /// Load R2 configuration from environment variables, if fully present.
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        Some(Self {
            account_id: var("R2_ACCOUNT_ID")?,
            access_key_id: var("R2_ACCESS_KEY_ID")?,
            secret_access_key: var("R2_SECRET_ACCESS_KEY")?,
            bucket: var("R2_BUCKET_NAME")?,
            public_domain: var("R2_PUBLIC_DOMAIN"),
        })
    }
}

/// Transport selection for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Streamable HTTP on a local port.
    #[default]
    Http,
    /// Stdio, for clients that spawn the server as a child process.
    Stdio,
}

/// Server process configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub transport: Transport,
    pub port: u16,
}

impl ServerConfig {
    /// Load server configuration from `TRANSPORT` and `PORT`.
    ///
    /// Unknown transport values fall back to HTTP, matching the default.
    pub fn from_env() -> Self {
        let transport = match std::env::var("TRANSPORT").as_deref() {
            Ok("stdio") => Transport::Stdio,
            _ => Transport::Http,
        };
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        Self { transport, port }
    }
}
