// claude2oai - OpenAI Chat Completions compatible gateway for Anthropic Claude
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use claude2oai::claude::ClaudeClient;
use claude2oai::cli::Args;
use claude2oai::config::AppConfig;
use claude2oai::server::create_router;
use claude2oai::utils::logging;
use claude2oai::vision::HttpImageFetcher;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration (defaults, file, env, then CLI overrides)
    let mut config = AppConfig::load_from(&args.config_path())?;
    args.apply(&mut config);

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting claude2oai v{}", env!("CARGO_PKG_VERSION"));

    if config.claude.api_key.is_empty() {
        warn!("No Claude API key configured; set ANTHROPIC_API_KEY or claude.api_key");
    }

    // Phase 3: Build upstream clients
    let client = ClaudeClient::new(&config.claude)?.with_log_sanitizing(config.logging.sanitize_tokens);
    let images = Arc::new(HttpImageFetcher::new(&config.vision)?);
    info!("Forwarding to {}", client.base_url());

    // Phase 4: Build and start HTTP server
    let app = create_router(config.clone(), client, images)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 5: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
