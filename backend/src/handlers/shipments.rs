//! HTTP handlers for customer shipments

use axum::{extract::State, http::StatusCode};
use shared::{Posted, Shipment};

use super::receipts::DeletedResponse;
use crate::error::AppResult;
use crate::extract::{Json, Path};
use crate::middleware::CurrentActor;
use crate::services::{CreateShipmentInput, ShipmentService};
use crate::AppState;

pub async fn list_shipments(
    State(state): State<AppState>,
    _actor: CurrentActor,
) -> AppResult<Json<Vec<Shipment>>> {
    let service = ShipmentService::from_state(&state);
    let shipments = service.list_shipments().await?;
    Ok(Json(shipments))
}

pub async fn get_shipment(
    State(state): State<AppState>,
    _actor: CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<Shipment>> {
    let service = ShipmentService::from_state(&state);
    let shipment = service.get_shipment(id).await?;
    Ok(Json(shipment))
}

/// Create a shipment and its PRODUCT_OUT ledger rows
pub async fn create_shipment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<CreateShipmentInput>,
) -> AppResult<(StatusCode, Json<Posted<Shipment>>)> {
    let service = ShipmentService::from_state(&state);
    let shipment = service.create_shipment(actor.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

pub async fn delete_shipment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<DeletedResponse>> {
    let service = ShipmentService::from_state(&state);
    service.delete_shipment(actor.user_id, id).await?;
    Ok(Json(DeletedResponse {
        message: "Shipment deleted (inventory transactions preserved)".to_string(),
    }))
}
