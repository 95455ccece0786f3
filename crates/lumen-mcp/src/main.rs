//! Lumen MCP Server - chat and image generation tools for MCP clients.
//!
//! This binary exposes an OpenAI-compatible upstream (default: Google AI's
//! compatibility endpoint) as two MCP tools, `chat` and `make_images`.
//! Generated images are uploaded to Cloudflare R2 when credentials are
//! configured, otherwise returned as inline base64.
//!
//! # Configuration
//!
//! Set these environment variables (a `.env` file is honored):
//!
//! - `OPENAI_API_KEY` - Required
//! - `OPENAI_BASE_URL` - Optional, defaults to the Google AI endpoint
//! - `OPENAI_MODEL` / `IMAGE_MODEL` - Optional model defaults
//! - `TRANSPORT` - `http` (default) or `stdio`
//! - `PORT` - HTTP transport port, default 8000
//! - `R2_ACCOUNT_ID`, `R2_ACCESS_KEY_ID`, `R2_SECRET_ACCESS_KEY`,
//!   `R2_BUCKET_NAME` - Optional, all four required to enable uploads
//! - `R2_PUBLIC_DOMAIN` - Optional custom domain for public URLs
//!
//! # Usage with an MCP client (stdio)
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "lumen": {
//!       "command": "/path/to/lumen-mcp",
//!       "env": { "TRANSPORT": "stdio", "OPENAI_API_KEY": "..." }
//!     }
//!   }
//! }
//! ```

use std::sync::Arc;

use anyhow::Result;
use rmcp::{
    transport::stdio,
    transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpService,
    },
    ServiceExt,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lumen_core::{ImageStore, OpenAiClient, R2Config, R2Store, ServerConfig, Services, Transport};

mod server;
mod tools;

use server::GatewayServer;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing to stderr (stdout is used for the stdio transport)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    tracing::info!("Starting Lumen MCP server");

    let services = Arc::new(initialize_services()?);
    let config = ServerConfig::from_env();

    match config.transport {
        Transport::Stdio => {
            let service = GatewayServer::new(services)
                .serve(stdio())
                .await
                .inspect_err(|e| {
                    tracing::error!("Server error: {:?}", e);
                })?;

            tracing::info!("MCP server running on stdio");
            service.waiting().await?;
        }
        Transport::Http => {
            let http_service = StreamableHttpService::new(
                move || Ok(GatewayServer::new(services.clone())),
                LocalSessionManager::default().into(),
                Default::default(),
            );

            let router = axum::Router::new().nest_service("/mcp", http_service);
            let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
            tracing::info!("MCP server running at http://0.0.0.0:{}/mcp", config.port);

            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
        }
    }

    Ok(())
}

/// Build the shared API client and optional R2 store from the environment.
fn initialize_services() -> Result<Services> {
    let client = Arc::new(OpenAiClient::from_env()?);
    tracing::info!(base_url = %client.config().base_url, "API client ready");

    let store: Option<Arc<dyn ImageStore>> = match R2Config::from_env() {
        Some(r2) => {
            tracing::info!(bucket = %r2.bucket, "R2 storage configured");
            Some(Arc::new(R2Store::new(r2)))
        }
        None => {
            tracing::info!("R2 storage not configured, images will be returned inline");
            None
        }
    };

    Ok(Services::new(client, store))
}
