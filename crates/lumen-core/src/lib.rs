//! lumen-core - Core library for lumen.
//!
//! A thin adapter exposing text chat and image generation from an
//! OpenAI-compatible endpoint. Responses from image-capable models embed
//! images through several undocumented conventions; this crate's extractor
//! probes them in a fixed order and the services fold every failure into a
//! structured outcome.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lumen_core::{OpenAiClient, Services, GenerateOptions};
//!
//! let client = Arc::new(OpenAiClient::from_env()?);
//! let services = Services::new(client, None);
//!
//! let outcome = services
//!     .generate("a lighthouse at dawn", GenerateOptions::default())
//!     .await;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod image;
pub mod message;
pub mod services;
pub mod storage;

// Re-export commonly used types
pub use client::{ChatCompletion, ChatRequest, ChatResponse, MessageContent, OpenAiClient};
pub use config::{ApiConfig, R2Config, ServerConfig, Transport};
pub use error::{Error, Result};
pub use image::{ImageExtractor, ImageLoader, ImageSource};
pub use message::{ContentPart, MultiModalPrompt, OutboundMessage};
pub use services::{ChatOutcome, GenerateOptions, GenerationOutcome, ImageLocation, Services};
pub use storage::{ImageStore, R2Store};
