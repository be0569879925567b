//! Document Builder Development Server
//!
//! Serves the template REST API from memory for local editing sessions and
//! client tests. Configure with `DOCBUILDER_ADDR` and `DOCBUILDER_BASE_PATH`.

use docbuilder_server::{AppState, ServerConfig, ServerError, app};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docbuilder_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let state = Arc::new(AppState::new());
    let app = app(state, &config.base_path);

    info!("Document builder dev server listening on {}", config.addr);
    info!("API base path: {}", if config.base_path.is_empty() { "/" } else { &config.base_path });

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
