// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::claude::{spawn_chunk_pipeline, StreamSignal};
use crate::error::{ProxyError, Result};
use crate::models::openai::{ChatCompletionRequest, ErrorResponse, Usage};
use crate::translation::{translate_request, translate_response, StreamTranslator};
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const DONE_EVENT: &str = "data: [DONE]\n\n";
const KEEP_ALIVE_EVENT: &str = ": keep-alive\n\n";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HashMap<String, HealthCheck>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    let mut overall_status = HealthStatus::Healthy;

    // A missing key only fails once a request reaches Claude
    let key_check = if state.config.claude.api_key.is_empty() {
        overall_status = HealthStatus::Degraded;
        HealthCheck {
            status: "warning".to_string(),
            message: "No Claude API key configured".to_string(),
        }
    } else {
        HealthCheck {
            status: "ok".to_string(),
            message: "Claude API key configured".to_string(),
        }
    };
    checks.insert("api_key".to_string(), key_check);

    let config_check = HealthCheck {
        status: "ok".to_string(),
        message: format!("API base: {}", state.client.base_url()),
    };
    checks.insert("configuration".to_string(), config_check);

    Json(HealthResponse {
        status: overall_status,
        checks,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Handler for /v1/chat/completions (OpenAI Chat Completions compatible)
pub async fn chat_completions_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Response> {
    debug!(
        "Raw request JSON (first 500 chars): {}",
        body.chars().take(500).collect::<String>()
    );

    // Deserialize by hand so malformed bodies get the OpenAI error envelope
    let request: ChatCompletionRequest = serde_json::from_str(&body).map_err(|e| {
        error!("Failed to deserialize request: {}", e);
        ProxyError::InvalidRequest(format!("JSON deserialization error: {}", e))
    })?;

    info!(
        "Received chat completion request: model={}, messages={}, stream={}",
        request.model,
        request.messages.len(),
        request.stream
    );

    if request.stream {
        stream_chat_completion(state, request).await
    } else {
        chat_completion(state, request).await
    }
}

async fn chat_completion(state: AppState, request: ChatCompletionRequest) -> Result<Response> {
    let claude_request = translate_request(&request, state.images.as_ref()).await?;
    debug!("Translated request to Claude format");

    let claude_response = state.client.create_message(&claude_request).await.map_err(|e| {
        error!("Claude API call failed: {}", e);
        e
    })?;

    let mut usage = Usage::default();
    let response = translate_response(claude_response, &request, &mut usage)?;

    info!(
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        total_tokens = usage.total_tokens,
        "Chat completion finished"
    );

    Ok(Json(response).into_response())
}

async fn stream_chat_completion(state: AppState, request: ChatCompletionRequest) -> Result<Response> {
    debug!("Starting streaming response for model: {}", request.model);

    let mut claude_request = translate_request(&request, state.images.as_ref()).await?;
    claude_request.stream = true;

    // Errors up to here still get a regular JSON error response
    let lines = state.client.stream_message(&claude_request).await?;

    let translator = StreamTranslator::new(request.model.clone());
    let mut signals = spawn_chunk_pipeline(
        lines,
        translator,
        Usage::default(),
        state.config.streaming.channel_capacity,
    );
    let keep_alive = Duration::from_secs(state.config.streaming.keep_alive_seconds.max(1));

    let sse_stream = async_stream::stream! {
        let mut chunk_count = 0usize;
        loop {
            tokio::select! {
                signal = signals.recv() => {
                    match signal {
                        Some(StreamSignal::Chunk(chunk)) => {
                            chunk_count += 1;
                            yield Ok::<String, Infallible>(chunk.to_sse());
                        }
                        Some(StreamSignal::Closed(usage)) => {
                            info!(
                                prompt_tokens = usage.prompt_tokens,
                                completion_tokens = usage.completion_tokens,
                                total_tokens = usage.total_tokens,
                                "Streamed chat completion finished after {} chunks",
                                chunk_count
                            );
                            yield Ok(DONE_EVENT.to_string());
                            break;
                        }
                        Some(StreamSignal::Failed { error, usage }) => {
                            warn!(
                                prompt_tokens = usage.prompt_tokens,
                                completion_tokens = usage.completion_tokens,
                                "Streamed chat completion failed after {} chunks: {}",
                                chunk_count,
                                error
                            );
                            yield Ok(error_event(&error));
                            break;
                        }
                        None => {
                            warn!("Chunk pipeline ended without a terminal signal");
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep(keep_alive) => {
                    debug!("Yielding keep-alive comment");
                    yield Ok(KEEP_ALIVE_EVENT.to_string());
                }
            }
        }
        debug!("SSE stream ended after {} chunks", chunk_count);
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header("X-Accel-Buffering", "no")
        .body(Body::from_stream(sse_stream))
        .map_err(|e| ProxyError::Internal(format!("Failed to build streaming response: {}", e)))
}

/// Error envelope as a final SSE record
fn error_event(error: &ProxyError) -> String {
    let envelope = ErrorResponse {
        error: error.to_openai_error(),
    };
    let data = serde_json::to_string(&envelope).unwrap_or_else(|_| "{}".to_string());
    format!("data: {}\n\n", data)
}
