//! Object storage for generated images.
//!
//! Generated images are uploaded to Cloudflare R2 through its S3-compatible
//! API and served from a public URL, instead of shipping base64 back to the
//! MCP client.

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;

use crate::config::R2Config;
use crate::error::{Error, Result};

/// Cache generated images aggressively; keys are unique per upload.
const CACHE_CONTROL: &str = "public, max-age=31536000";

/// Seam for image persistence, so orchestration can be tested without a
/// live bucket.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store encoded image bytes and return a public URL.
    async fn store_image(&self, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

/// Cloudflare R2 store.
pub struct R2Store {
    client: aws_sdk_s3::Client,
    config: R2Config,
}

impl R2Store {
    /// Build an S3 client against the R2 endpoint for this account, with
    /// static credentials and the `auto` region R2 expects.
    pub fn new(config: R2Config) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "r2-static",
        );
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("auto"))
            .endpoint_url(format!(
                "https://{}.r2.cloudflarestorage.com",
                config.account_id
            ))
            .credentials_provider(credentials)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            config,
        }
    }

    /// Public URL for an object: the custom domain when configured, else
    /// the bucket's r2.dev host.
    pub fn public_url(&self, key: &str) -> String {
        match &self.config.public_domain {
            Some(domain) => format!("{}/{}", domain.trim_end_matches('/'), key),
            None => format!(
                "https://{}.{}.r2.dev/{}",
                self.config.bucket, self.config.account_id, key
            ),
        }
    }

    /// Upload raw bytes under an explicit key and return the public URL.
    pub async fn store_bytes(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .cache_control(CACHE_CONTROL)
            .send()
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        let url = self.public_url(key);
        tracing::info!(%url, "uploaded image to R2");
        Ok(url)
    }
}

/// Generate a unique object key for an image of the given MIME type.
fn object_key(content_type: &str) -> String {
    let extension = match content_type.rsplit('/').next().unwrap_or("png") {
        "jpeg" => "jpg",
        other => other,
    };
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("image_{}.{}", &id[..12], extension)
}

#[async_trait]
impl ImageStore for R2Store {
    async fn store_image(&self, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        self.store_bytes(&object_key(content_type), bytes, content_type)
            .await
    }
}
