//! Configuration data structures for the claude2oai gateway.
//!
//! This module defines the schema for the application settings, including
//! server parameters, the upstream Claude connection, streaming and image
//! handling limits.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port, body limit).
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream Claude API settings.
    #[serde(default)]
    pub claude: ClaudeConfig,

    /// Streaming hand-off settings.
    #[serde(default)]
    pub streaming: StreamingConfig,

    /// Image fetching settings.
    #[serde(default)]
    pub vision: VisionConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `8080`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body size in bytes (inline base64 images count).
    /// Default: `50 MiB`
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Settings for the upstream Claude API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeConfig {
    /// Base URL for the Anthropic API; `/messages` is appended.
    /// Default: `https://api.anthropic.com/v1`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// API key sent as `x-api-key`.
    /// Default: the `ANTHROPIC_API_KEY` environment variable.
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Value of the `anthropic-version` header.
    /// Default: `2023-06-01`
    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,

    /// Request timeout in seconds (covers the whole streamed body).
    /// Default: `300` (5 minutes)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// TCP connect timeout in seconds.
    /// Default: `10`
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

/// Settings for the streaming pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Capacity of the bounded queue between the upstream reader and the client writer.
    /// Default: `64`
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Interval between `: keep-alive` comments while the upstream is idle.
    /// Default: `15`
    #[serde(default = "default_keep_alive")]
    pub keep_alive_seconds: u64,
}

/// Settings for resolving `image_url` parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Timeout for downloading one image.
    /// Default: `30`
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,

    /// Maximum decoded image size in bytes.
    /// Default: `20 MiB`
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Whether to mask API keys in logged upstream payloads.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub sanitize_tokens: bool,
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: default_api_key(),
            anthropic_version: default_anthropic_version(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            keep_alive_seconds: default_keep_alive(),
        }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_seconds: default_fetch_timeout(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            sanitize_tokens: true,
        }
    }
}

// Helper functions for serde defaults and shared constants
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_api_base_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}

fn default_api_key() -> String {
    std::env::var("ANTHROPIC_API_KEY").unwrap_or_default()
}

fn default_anthropic_version() -> String {
    "2023-06-01".to_string()
}

fn default_timeout() -> u64 {
    300
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_channel_capacity() -> usize {
    64
}

fn default_keep_alive() -> u64 {
    15
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_max_image_bytes() -> usize {
    crate::vision::models::MAX_IMAGE_SIZE_BYTES
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
