//! Axum-based HTTP server implementation for the claude2oai gateway.
//!
//! This module sets up the HTTP server, configures routes, and handles
//! incoming requests from clients that speak the OpenAI Chat Completions API.
//! Requests are bridged to the Anthropic Claude Messages API.
//!
//! # Components
//!
//! - `handlers`: Chat completion (JSON and SSE) and health endpoints.
//! - `middleware`: Request ID propagation and CORS.
//! - `routes`: The router configuration that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use handlers::{HealthResponse, HealthStatus};
pub use routes::{create_router, AppState};
