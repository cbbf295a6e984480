use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use engagement_backend::{build_router, AppState, Config, ProcessBackend, SqliteStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version flag
    if std::env::args().any(|a| a == "--version" || a == "-V") {
        println!("engagement-backend {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Load configuration
    let config = Config::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Engagement Predictor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize components
    let store = Arc::new(SqliteStore::new(&config.database.url)?);
    let backend = Arc::new(ProcessBackend::new(config.inference.clone()));

    tracing::info!(
        executable = %config.inference.executable,
        script = %config.inference.script_path,
        model = %config.inference.model_path,
        max_concurrent = config.inference.max_concurrent,
        timeout_secs = config.inference.timeout_secs,
        "Inference process configured"
    );

    if config.explain.api_key.is_none() {
        tracing::warn!("No explanation API key configured, /api/explain will fail");
    }
    if config.vision.api_key.is_none() {
        tracing::warn!("No vision API key configured, /api/extract will fail");
    }

    let addr = format!("{}:{}", config.api.host, config.api.port);
    let state = Arc::new(AppState::new(config, backend, store));
    let app = build_router(state);

    // Start server
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
