use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tensorboard_relay::{server, AppState, RelayConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tensorboard_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── 1. Configuration ─────────────────────────────────────────
    let config = RelayConfig::from_env();
    tracing::info!("Starting tensorboard-relay v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Log directory: {:?}", config.log_dir);
    tracing::info!("TensorBoard:   {}", config.tensorboard_url);

    // ── 2. Build shared state ────────────────────────────────────
    let addr = config.bind_address();
    let state = Arc::new(AppState::new(config)?);

    // ── 3. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state);

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
