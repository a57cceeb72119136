use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use headlines::config::Config;
use headlines::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "headlines=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        std::env::var("PORTAL_CONFIG").unwrap_or_else(|_| "portal.toml".to_string());
    let mut config = Config::load_or_default(&config_path)?;
    config.apply_env();
    config.validate()?;
    info!(
        "Loaded configuration from {} ({} publications)",
        config_path,
        config.publications.len()
    );

    let state = Arc::new(AppState::from_config(&config)?);
    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Server starting on http://{}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
