use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tryon::handlers;
use tryon::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::from_env();
    let config = state.config.clone();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    handlers::health::init_start_time();

    if state.credentials.resolve().is_none() {
        tracing::warn!(
            var = %config.api_key_var,
            "Model credential is not set; generate requests will fail until it is configured"
        );
    }

    let app = build_router(Arc::new(state));

    let addr = config.listen_addr.clone();
    tracing::info!(model = %config.gemini_model, "Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
