//! HTTP handlers for supplier receipts

use axum::{extract::State, http::StatusCode};
use serde::Serialize;
use shared::{Posted, Receipt};

use crate::error::AppResult;
use crate::extract::{Json, Path};
use crate::middleware::CurrentActor;
use crate::services::{CreateReceiptInput, ReceivingService};
use crate::AppState;

/// Body returned by header deletes
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: String,
}

pub async fn list_receipts(
    State(state): State<AppState>,
    _actor: CurrentActor,
) -> AppResult<Json<Vec<Receipt>>> {
    let service = ReceivingService::from_state(&state);
    let receipts = service.list_receipts().await?;
    Ok(Json(receipts))
}

pub async fn get_receipt(
    State(state): State<AppState>,
    _actor: CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<Receipt>> {
    let service = ReceivingService::from_state(&state);
    let receipt = service.get_receipt(id).await?;
    Ok(Json(receipt))
}

/// Create a receipt and its MATERIAL_IN ledger rows
pub async fn create_receipt(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<CreateReceiptInput>,
) -> AppResult<(StatusCode, Json<Posted<Receipt>>)> {
    let service = ReceivingService::from_state(&state);
    let receipt = service.create_receipt(actor.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn delete_receipt(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<DeletedResponse>> {
    let service = ReceivingService::from_state(&state);
    service.delete_receipt(actor.user_id, id).await?;
    Ok(Json(DeletedResponse {
        message: "Receipt deleted (inventory transactions preserved)".to_string(),
    }))
}
