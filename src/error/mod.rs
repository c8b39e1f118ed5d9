// Error types for claude2oai gateway
// Author: kelexine (https://github.com/kelexine)

use crate::models::openai::{ErrorResponse, OpenAiError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// A provider-reported error translated into OpenAI vocabulary, with the HTTP status to surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderError {
    pub status: StatusCode,
    pub error: OpenAiError,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error.message)
    }
}

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid image reference: {0}")]
    InvalidImage(String),

    #[error("Claude API error: {0}")]
    Provider(ProviderError),

    #[error("Failed to decode Claude payload: {0}")]
    Decode(String),

    #[error("Claude API returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// HTTP status surfaced to the client
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::InvalidRequest(_) | ProxyError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            ProxyError::Provider(e) => e.status,
            ProxyError::Upstream { .. } | ProxyError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// OpenAI error object describing this failure
    pub fn to_openai_error(&self) -> OpenAiError {
        if let ProxyError::Provider(e) = self {
            return e.error.clone();
        }

        let (error_type, code) = match self {
            ProxyError::InvalidRequest(_) => ("invalid_request_error", None),
            ProxyError::InvalidImage(_) => ("invalid_request_error", Some("image_url_invalid")),
            ProxyError::Decode(_) => ("decode_error", Some("decode_claude_response_failed")),
            ProxyError::Upstream { .. } | ProxyError::Http(_) => ("upstream_error", None),
            ProxyError::Config(_) | ProxyError::ConfigParsing(_) => ("configuration_error", None),
            _ => ("api_error", None),
        };

        OpenAiError {
            message: self.to_string(),
            error_type: error_type.to_string(),
            code: code.map(str::to_string),
        }
    }
}

// Convert ProxyError to HTTP responses for Axum
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_openai_error(),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
