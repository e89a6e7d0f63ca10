//! Warehouse Inventory Management - Backend Server

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warehouse_inventory_backend::{
    audit::{self, AuditSink},
    config::{Config, StorageBackend},
    create_app,
    store::{MemoryStore, PgStore, Stores},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wims_server=debug,warehouse_inventory_backend=debug,tower_http=debug,sqlx=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Warehouse Inventory Server");
    tracing::info!("Environment: {}", config.environment);

    let stores = match config.storage.backend {
        StorageBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let store = PgStore::connect(&config.database).await?;
            tracing::info!("Database connection established");

            if config.database.run_migrations {
                tracing::info!("Running database migrations...");
                store.migrate().await?;
                tracing::info!("Migrations completed");
            }

            Stores::from_backend(Arc::new(store))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Stores::from_backend(Arc::new(MemoryStore::new()))
        }
    };

    // Audit writer runs until every sink is dropped
    let (sink, receiver) = AuditSink::channel(config.audit.channel_capacity);
    let writer = audit::spawn_writer(receiver, stores.audit.clone());

    let state = AppState::new(&stores, sink, config.clone());
    let app = create_app(state);

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    writer.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
