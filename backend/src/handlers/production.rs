//! HTTP handlers for production runs

use axum::{extract::State, http::StatusCode};
use shared::{Posted, ProductionRun};

use super::receipts::DeletedResponse;
use crate::error::AppResult;
use crate::extract::{Json, Path};
use crate::middleware::CurrentActor;
use crate::services::{CreateProductionRunInput, ProductionService};
use crate::AppState;

pub async fn list_production_runs(
    State(state): State<AppState>,
    _actor: CurrentActor,
) -> AppResult<Json<Vec<ProductionRun>>> {
    let service = ProductionService::from_state(&state);
    let runs = service.list_production_runs().await?;
    Ok(Json(runs))
}

pub async fn get_production_run(
    State(state): State<AppState>,
    _actor: CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<ProductionRun>> {
    let service = ProductionService::from_state(&state);
    let run = service.get_production_run(id).await?;
    Ok(Json(run))
}

/// Record a production run with its consumption and output rows
pub async fn create_production_run(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<CreateProductionRunInput>,
) -> AppResult<(StatusCode, Json<Posted<ProductionRun>>)> {
    let service = ProductionService::from_state(&state);
    let run = service.create_production_run(actor.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(run)))
}

pub async fn delete_production_run(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<DeletedResponse>> {
    let service = ProductionService::from_state(&state);
    service.delete_production_run(actor.user_id, id).await?;
    Ok(Json(DeletedResponse {
        message: "Production run deleted (inventory transactions preserved)".to_string(),
    }))
}
