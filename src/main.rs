use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, EnvFilter};

use fusician::{
    build_router,
    config::Config,
    demo::DemoModel,
    flows::Flows,
    gemini::GeminiClient,
    history::{FileStore, HistoryStore},
    model::GenerativeModel,
    orchestrator::Orchestrator,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!("Using API key: {}", config.masked_key());
    tracing::info!(options = ?config.fuse, text_model = %config.text_model, image_model = %config.image_model, "Fuse pipeline configured");

    let model: Arc<dyn GenerativeModel> = match &config.api_key {
        Some(key) => Arc::new(GeminiClient::new(key.clone(), config.api_base.clone())),
        None => {
            tracing::warn!("GEMINI_API_KEY not set, running in demo mode");
            Arc::new(DemoModel)
        }
    };
    let flows = Flows::new(model, config.text_model.clone(), config.image_model.clone());
    let history = HistoryStore::open(Box::new(FileStore::new(&config.history_dir)));
    let state = AppState::new(Orchestrator::new(flows, config.fuse), history);

    let app = build_router(state);

    let addr = SocketAddr::from(([0,0,0,0], config.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
