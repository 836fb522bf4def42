use anyhow::anyhow;
use tokio::net::TcpListener;
use tracing::info;

use dialprobe::{AppState, ServerConfig, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration; missing signing credentials are fatal here rather
    // than surfacing as per-request failures.
    let config = ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?;
    let address = config.address();

    info!("Starting server on {address}");
    info!("TwiML application SID: {}", config.twiml_app_sid);
    info!("Webhook mode: {}", config.webhook_mode);

    // Create application state
    let app_state = AppState::new(config);

    // Combine API routes (token, health) with the voice webhook
    let app = routes::api::create_api_router()
        .merge(routes::webhooks::create_webhook_router())
        .with_state(app_state);

    // Create listener
    let listener = TcpListener::bind(&address).await?;

    info!("Server listening on {address}");

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
