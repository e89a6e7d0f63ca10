//! Warehouse inventory ledger service
//!
//! Stock is derived from an append-only ledger written by the receiving,
//! production, shipment and manual adjustment workflows.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod audit;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use audit::AuditSink;
use store::{CatalogRepository, LedgerRepository, Stores};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogRepository>,
    pub ledger: Arc<dyn LedgerRepository>,
    pub audit: AuditSink,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(stores: &Stores, audit: AuditSink, config: Config) -> Self {
        Self {
            catalog: stores.catalog.clone(),
            ledger: stores.ledger.clone(),
            audit,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Warehouse Inventory Management API v1.0"
}
