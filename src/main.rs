use std::sync::Arc;

use clip_catalog::{
    config::Config, handlers::create_router, models::AppState, system_info,
    twelvelabs::TwelveLabsClient,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    // Print system info at startup
    system_info::print_startup_info(&config);

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;

    // Create app state
    let app_state = Arc::new(AppState {
        listing: Arc::new(TwelveLabsClient::new(http, &config.twelvelabs)),
        config: config.clone(),
    });

    let app = create_router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    info!("🚀 Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("✅ Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
