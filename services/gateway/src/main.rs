mod config;
mod error;
mod handlers;
mod models;
mod router;
mod state;

use config::GatewayConfig;
use grouping_engine::{MemoryStore, UnderwritingService};
use router::create_router;
use state::AppState;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting underwriting data gateway");

    let config = GatewayConfig::from_env();

    // The engine is constructed once with its store handle and handed to
    // the router; handlers never reach for a global service.
    let service = UnderwritingService::new(MemoryStore::new());
    let state = AppState::new(service);

    // Create router
    let app = create_router(state);

    // Bind and serve
    let listener = TcpListener::bind(config.addr).await?;
    tracing::info!("Listening on {}", config.addr);
    axum::serve(listener, app).await?;

    Ok(())
}
