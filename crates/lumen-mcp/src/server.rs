//! MCP server implementation for the lumen gateway.
//!
//! Uses the rmcp SDK's macro-based approach for defining tools.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars, tool, tool_handler, tool_router,
    ErrorData as McpError, RoleServer, ServerHandler,
};

use lumen_core::{ChatOutcome, GenerateOptions, GenerationOutcome, Services};

use crate::tools::*;

/// MCP server exposing chat and image generation.
///
/// Wraps a `lumen_core::Services` instance and exposes it as MCP tools.
#[derive(Clone)]
pub struct GatewayServer {
    services: Arc<Services>,
    tool_router: ToolRouter<GatewayServer>,
}

#[tool_router]
impl GatewayServer {
    /// Create a new GatewayServer wrapping the given services.
    pub fn new(services: Arc<Services>) -> Self {
        Self {
            services,
            tool_router: Self::tool_router(),
        }
    }

    /// Chat with text models.
    ///
    /// Returns the answer text, or `Error: <message>` on failure — the
    /// tool itself never errors.
    #[tool(
        name = "chat",
        description = "Chat with text models. Sends a single-turn message, optionally prefixed with a system prompt, and returns the answer text."
    )]
    async fn chat(
        &self,
        Parameters(input): Parameters<ChatInput>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .services
            .chat(
                &input.message,
                input.model.as_deref(),
                input.system_prompt.as_deref(),
                None,
            )
            .await;

        let text = match outcome {
            ChatOutcome::Success { text, .. } => text,
            ChatOutcome::Failure { message, .. } => format!("Error: {}", message),
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Generate images, with or without reference images.
    #[tool(
        name = "make_images",
        description = "Generate images. Supports text-only prompts or reference image paths for style guidance. Returns a public URL when object storage is configured, else base64 image data."
    )]
    async fn make_images(
        &self,
        Parameters(input): Parameters<MakeImagesInput>,
    ) -> Result<CallToolResult, McpError> {
        let options = GenerateOptions {
            reference_images: input.reference_images.unwrap_or_default(),
            aspect_ratio: input.aspect_ratio,
            resolution: input.resolution,
            model: input.model,
        };

        let output = match self.services.generate(&input.message, options).await {
            GenerationOutcome::Success {
                location,
                model,
                warning,
            } => MakeImagesResult {
                success: true,
                image_path: Some(location.into_inner()),
                model: Some(model),
                error: None,
                warning,
            },
            GenerationOutcome::Failure { message, .. } => MakeImagesResult {
                success: false,
                image_path: None,
                model: None,
                error: Some(message),
                warning: None,
            },
        };

        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&output).unwrap_or_default(),
        )]))
    }
}

#[tool_handler]
impl ServerHandler for GatewayServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Lumen gateway - chat and image generation over an OpenAI-compatible API. \
                 Use chat for single-turn text questions and make_images to generate \
                 images, optionally guided by local reference images."
                    .to_string(),
            ),
        }
    }
}
