// Claude Messages API client
// Author: kelexine (https://github.com/kelexine)

use super::streaming::{split_lines, LineStream};
use crate::config::ClaudeConfig;
use crate::error::{ProxyError, Result};
use crate::models::anthropic::{MessagesRequest, MessagesResponse};
use crate::translation::map_provider_error;
use crate::utils::logging::sanitize;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, error};

/// Client for the Anthropic Messages API.
///
/// Holds one pooled HTTP client; cloning the inner `reqwest::Client` is cheap
/// so a single instance is shared across all requests.
pub struct ClaudeClient {
    http_client: Client,
    config: ClaudeConfig,
    sanitize_logs: bool,
}

impl ClaudeClient {
    /// Build the pooled HTTP client from configuration.
    pub fn new(config: &ClaudeConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .build()
            .map_err(|e| ProxyError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created HTTP client for {}", config.api_base_url);

        Ok(Self {
            http_client,
            config: config.clone(),
            sanitize_logs: true,
        })
    }

    /// Toggle API key masking in logged upstream bodies
    pub fn with_log_sanitizing(mut self, enabled: bool) -> Self {
        self.sanitize_logs = enabled;
        self
    }

    /// Get the API base_url
    pub fn base_url(&self) -> &str {
        &self.config.api_base_url
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.config.api_base_url.trim_end_matches('/'))
    }

    fn post(&self, request: &MessagesRequest) -> RequestBuilder {
        self.http_client
            .post(self.messages_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.anthropic_version)
            .header("content-type", "application/json")
            .json(request)
    }

    fn loggable<'a>(&self, body: &'a str) -> std::borrow::Cow<'a, str> {
        if self.sanitize_logs {
            std::borrow::Cow::Owned(sanitize(body))
        } else {
            std::borrow::Cow::Borrowed(body)
        }
    }

    /// Call `POST /messages` and decode the reply.
    ///
    /// A non-2xx reply that carries a Claude error payload is returned as a
    /// response so the translator maps it; any other non-2xx reply becomes
    /// `ProxyError::Upstream`.
    pub async fn create_message(&self, request: &MessagesRequest) -> Result<MessagesResponse> {
        debug!("Calling Claude messages API for model: {}", request.model);

        let response = self.post(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Claude API error: HTTP {} - Response body: {}", status, self.loggable(&body));

            return match serde_json::from_str::<MessagesResponse>(&body) {
                Ok(decoded) if decoded.error.as_ref().is_some_and(|e| !e.is_empty()) => Ok(decoded),
                _ => Err(ProxyError::Upstream {
                    status: status.as_u16(),
                    body,
                }),
            };
        }

        debug!(
            "Raw Claude response (first 500 chars): {}",
            self.loggable(&body.chars().take(500).collect::<String>())
        );

        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse Claude response: {}", e);
            ProxyError::Decode(e.to_string())
        })
    }

    /// Call `POST /messages` with `stream: true` and return the body as lines.
    ///
    /// Non-2xx replies are read in full and surfaced as errors before any
    /// chunk is produced.
    pub async fn stream_message(&self, request: &MessagesRequest) -> Result<LineStream> {
        debug!("Calling Claude streaming messages API for model: {}", request.model);

        let response = self
            .post(request)
            .header("accept", "text/event-stream")
            .send()
            .await?;

        let response = self.check_stream_status(response).await?;

        debug!("Claude SSE stream opened");
        Ok(Box::pin(split_lines(response.bytes_stream())))
    }

    async fn check_stream_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("Claude streaming API error: HTTP {} - {}", status, self.loggable(&body));

        let mapped = serde_json::from_str::<MessagesResponse>(&body)
            .ok()
            .and_then(|decoded| map_provider_error(decoded.error.as_ref()));

        Err(match mapped {
            Some(provider_error) => ProxyError::Provider(provider_error),
            None => ProxyError::Upstream {
                status: status.as_u16(),
                body,
            },
        })
    }
}
