//! Route definitions for the warehouse inventory service

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - ledger queries and manual adjustment
        .nest("/inventory", inventory_routes(state.clone()))
        // Protected routes - workflows
        .nest("/receipts", receipt_routes(state.clone()))
        .nest("/production-runs", production_routes(state.clone()))
        .nest("/shipments", shipment_routes(state))
}

/// Inventory ledger routes (protected)
fn inventory_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stock", get(handlers::get_current_stock))
        .route("/stock/:item_kind/:item_id", get(handlers::get_item_stock))
        .route("/transactions", get(handlers::list_transactions))
        .route("/low-stock", get(handlers::get_low_stock))
        .route("/user-activity", get(handlers::get_user_activity))
        .route("/adjust", post(handlers::adjust_inventory))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Receipt routes (protected)
fn receipt_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_receipts).post(handlers::create_receipt),
        )
        .route(
            "/:id",
            get(handlers::get_receipt).delete(handlers::delete_receipt),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Production run routes (protected)
fn production_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_production_runs).post(handlers::create_production_run),
        )
        .route(
            "/:id",
            get(handlers::get_production_run).delete(handlers::delete_production_run),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Shipment routes (protected)
fn shipment_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_shipments).post(handlers::create_shipment),
        )
        .route(
            "/:id",
            get(handlers::get_shipment).delete(handlers::delete_shipment),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
