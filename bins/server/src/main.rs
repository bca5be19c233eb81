//! Custodian API Server
//!
//! Main entry point for the custody holdings service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, info_span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use custodian_api::{AppState, create_router};
use custodian_core::custody::CustodyService;
use custodian_db::{PgCustodyRepository, connect};
use custodian_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "custodian=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    // Connect to database
    let db = connect(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    // Wire the custody service to Postgres
    let repo = Arc::new(PgCustodyRepository::new(db));
    let custody = CustodyService::new(repo).with_span(info_span!("custody_service"));

    let state = AppState {
        custody: Arc::new(custody),
        custody_config: config.custody,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
