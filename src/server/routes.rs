// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{chat_completions_handler, health_handler};
use super::middleware::{cors_layer, request_id_layers};
use crate::claude::ClaudeClient;
use crate::config::AppConfig;
use crate::error::Result;
use crate::vision::ImageFetcher;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub client: Arc<ClaudeClient>,
    pub images: Arc<dyn ImageFetcher>,
}

pub fn create_router(
    config: AppConfig,
    client: ClaudeClient,
    images: Arc<dyn ImageFetcher>,
) -> Result<Router> {
    let max_body_bytes = config.server.max_body_bytes;
    let state = AppState {
        config,
        client: Arc::new(client),
        images,
    };

    let (set_request_id, propagate_request_id) = request_id_layers();

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/chat/completions", post(chat_completions_handler))
        // Inline base64 images make bodies large
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    Ok(app)
}
