//! Image host collaborator
//!
//! Post images are not stored locally; they are pushed to an external
//! image-hosting service which answers with the public URL the post will
//! carry.

use anyhow::Result;
use reqwest::multipart;
use serde::Deserialize;
use tracing::info;

/// Image host configuration
#[derive(Debug, Clone)]
pub struct ImageHostConfig {
    /// Upload endpoint URL
    pub upload_url: String,
    /// Optional bearer token for the image host
    pub api_key: Option<String>,
}

impl ImageHostConfig {
    /// Create a new ImageHostConfig from environment variables
    ///
    /// # Environment Variables
    /// - `IMAGE_HOST_URL`: Upload endpoint (required)
    /// - `IMAGE_HOST_API_KEY`: Bearer token (optional)
    pub fn from_env() -> Result<Self> {
        let upload_url = std::env::var("IMAGE_HOST_URL")
            .map_err(|_| anyhow::anyhow!("IMAGE_HOST_URL environment variable not set"))?;

        let api_key = std::env::var("IMAGE_HOST_API_KEY").ok();

        Ok(ImageHostConfig {
            upload_url,
            api_key,
        })
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Client for the external image host
#[derive(Clone)]
pub struct ImageHost {
    client: reqwest::Client,
    config: ImageHostConfig,
}

impl ImageHost {
    /// Create a new image host client
    pub fn new(config: ImageHostConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Upload a file and return its public URL
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        info!("Uploading {} ({} bytes) to image host", file_name, bytes.len());

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = multipart::Form::new().part("file", part);

        let mut request = self.client.post(&self.config.upload_url).multipart(form);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?.error_for_status()?;
        let body: UploadResponse = response.json().await?;

        Ok(body.secure_url)
    }
}
