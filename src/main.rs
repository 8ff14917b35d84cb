use anyhow::{Context, Result};
use kbgateway::{api, config, knowledge_base::KnowledgeBaseService, logging};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<()> {
    config::init_config();
    let config = config::get_config();
    logging::init_tracing(&config.log_destination);
    config::log_config(config);

    let service = KnowledgeBaseService::new(config).await;
    let app = api::create_router(Arc::new(service), config.upload_max_body_bytes)
        .layer(api::cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.server_port))
        .await
        .with_context(|| format!("failed to bind port {}", config.server_port))?;
    tracing::info!("Listening on http://0.0.0.0:{}", config.server_port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated unexpectedly")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
