// Image URL resolution (OpenAI image_url → Claude base64 source)
// Author: kelexine (https://github.com/kelexine)

use super::models::{validate_image_size, FetchedImage, ImageError, ImageFormat};
use crate::config::VisionConfig;
use crate::error::{ProxyError, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Resolves an image reference into media type and base64 data.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchedImage, ImageError>;
}

/// Fetches `http(s)` images over the network and decodes `data:` URLs in place.
pub struct HttpImageFetcher {
    client: Client,
    max_bytes: usize,
}

impl HttpImageFetcher {
    pub fn new(config: &VisionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_seconds))
            .use_rustls_tls()
            .build()
            .map_err(|e| ProxyError::Internal(format!("Failed to create image HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config.max_image_bytes))
    }

    pub fn with_client(client: Client, max_bytes: usize) -> Self {
        Self { client, max_bytes }
    }

    async fn download(&self, url: &str) -> std::result::Result<FetchedImage, ImageError> {
        debug!("Downloading image from {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Status(status.as_u16()));
        }

        let declared = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(len) = response.content_length() {
            validate_image_size(len as usize, self.max_bytes)?;
        }

        let bytes = response.bytes().await?;
        validate_image_size(bytes.len(), self.max_bytes)?;

        let format = resolve_format(declared.as_deref(), &bytes)?;
        debug!("Downloaded {} image ({} bytes)", format.mime_type(), bytes.len());

        Ok(FetchedImage {
            media_type: format.mime_type().to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(&bytes),
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchedImage, ImageError> {
        if url.starts_with("data:") {
            decode_data_url(url, self.max_bytes)
        } else if url.starts_with("http://") || url.starts_with("https://") {
            self.download(url).await
        } else {
            let scheme = url.split(':').next().unwrap_or_default();
            Err(ImageError::UnsupportedScheme(scheme.to_string()))
        }
    }
}

/// Decode `data:<mime>;base64,<payload>`
fn decode_data_url(url: &str, max_bytes: usize) -> std::result::Result<FetchedImage, ImageError> {
    let rest = url.strip_prefix("data:").ok_or(ImageError::MalformedDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(ImageError::MalformedDataUrl)?;
    let declared = header
        .strip_suffix(";base64")
        .ok_or(ImageError::MalformedDataUrl)?;

    let payload = payload.trim();
    let decoded = base64::engine::general_purpose::STANDARD.decode(payload)?;
    validate_image_size(decoded.len(), max_bytes)?;

    let declared = (!declared.is_empty()).then_some(declared);
    let format = resolve_format(declared, &decoded)?;

    Ok(FetchedImage {
        media_type: format.mime_type().to_string(),
        data: payload.to_string(),
    })
}

/// Prefer the declared type when Claude supports it, otherwise sniff the bytes
fn resolve_format(declared: Option<&str>, data: &[u8]) -> std::result::Result<ImageFormat, ImageError> {
    declared
        .and_then(ImageFormat::from_mime_type)
        .or_else(|| ImageFormat::detect(data))
        .ok_or_else(|| ImageError::UnsupportedFormat(declared.unwrap_or("unknown").to_string()))
}
