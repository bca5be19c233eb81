//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - JSON RPC-style custody routes
//! - Error responses mapped from domain errors
//! - Health check

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use custodian_core::custody::CustodyService;
use custodian_shared::CustodyConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Custody service.
    pub custody: Arc<CustodyService>,
    /// Query paging limits.
    pub custody_config: CustodyConfig,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
